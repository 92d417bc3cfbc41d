//! Level-synchronous frontier queue.
//!
//! A `SlidingQueue` is one append-only buffer plus a *window* over the items that
//! were published by the most recent `slide_window`. Appends made while a round is
//! iterating the window land past its end and stay hidden until the next slide, so
//! workers can expand depth `d` and emit depth `d + 1` into the same buffer without
//! per-item synchronization.
//!
//! Parallel producers go through a `QueueBuffer`: a thread-local batch that is
//! copied into the shared buffer with a single atomic reservation per flush.

use crate::collections::ParallelVector;

/// Default number of items a `QueueBuffer` batches before flushing.
pub const DEFAULT_BATCH: usize = 16_384;

/// Double-buffered append queue; appends are invisible until `slide_window`.
pub struct SlidingQueue<T: Copy + Send + Sync> {
    shared: ParallelVector<T>,
    window_start: usize,
}

impl<T: Copy + Send + Sync> SlidingQueue<T> {
    /// Creates a queue able to hold `capacity` items over its whole lifetime
    /// (until the next `reset`).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: ParallelVector::with_capacity(capacity),
            window_start: 0,
        }
    }

    /// Total capacity of the shared buffer.
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Appends `item` from a single writer. Visible after the next `slide_window`.
    ///
    /// # Panics
    /// Panics if the shared buffer is full.
    pub fn push(&mut self, item: T) {
        assert!(
            self.shared.push_atomic(item).is_ok(),
            "sliding queue overflow (capacity {})",
            self.shared.capacity()
        );
    }

    /// Returns `true` if the current window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window_start == self.shared.len()
    }

    /// Number of items in the current window.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len() - self.window_start
    }

    /// Empties the queue and both cursors.
    pub fn reset(&mut self) {
        self.shared.clear();
        self.window_start = 0;
    }

    /// Advances the window to cover everything appended since the last slide.
    ///
    /// `&mut self` is the round barrier: every `QueueBuffer` borrowing this queue has
    /// been dropped (and therefore flushed).
    pub fn slide_window(&mut self) {
        self.window_start = self.shared.len();
        self.shared.publish();
    }

    /// Items of the current window.
    #[inline]
    pub fn window(&self) -> &[T] {
        &self.shared[self.window_start..]
    }

    /// Index of the first item of the current window within `history()`.
    #[inline]
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// Index one past the last published item.
    #[inline]
    pub fn window_end(&self) -> usize {
        self.shared.len()
    }

    /// Every item published since the last `reset`, in publication order.
    #[inline]
    pub fn history(&self) -> &[T] {
        self.shared.as_slice()
    }

    /// Opens a thread-local batching buffer with the default batch size.
    pub fn buffer(&self) -> QueueBuffer<'_, T> {
        QueueBuffer::new(self, DEFAULT_BATCH)
    }

    /// Opens a thread-local batching buffer flushing every `batch` items.
    pub fn buffer_with_batch(&self, batch: usize) -> QueueBuffer<'_, T> {
        QueueBuffer::new(self, batch)
    }
}

/// Thread-local batch of appends destined for a `SlidingQueue`.
///
/// Flushes automatically when full and when dropped.
pub struct QueueBuffer<'q, T: Copy + Send + Sync> {
    queue: &'q SlidingQueue<T>,
    local: Vec<T>,
    batch: usize,
}

impl<'q, T: Copy + Send + Sync> QueueBuffer<'q, T> {
    /// Creates a buffer for `queue` that flushes every `batch` items.
    ///
    /// # Panics
    /// Panics if `batch == 0`.
    pub fn new(queue: &'q SlidingQueue<T>, batch: usize) -> Self {
        assert!(batch != 0, "batch must be > 0");
        Self {
            queue,
            local: Vec::new(),
            batch,
        }
    }

    /// Appends `item` locally, flushing first if the batch is full.
    #[inline]
    pub fn push(&mut self, item: T) {
        if self.local.len() == self.batch {
            self.flush();
        }
        if self.local.capacity() == 0 {
            self.local.reserve_exact(self.batch.min(1024));
        }
        self.local.push(item);
    }

    /// Copies the batch into the shared buffer with one atomic reservation.
    pub fn flush(&mut self) {
        if !self.local.is_empty() {
            self.queue.shared.extend_atomic(&self.local);
            self.local.clear();
        }
    }

    /// Items waiting in the local batch.
    pub fn len(&self) -> usize {
        self.local.len()
    }

    /// Returns `true` if nothing is waiting locally.
    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}

impl<T: Copy + Send + Sync> Drop for QueueBuffer<'_, T> {
    fn drop(&mut self) {
        self.flush();
    }
}
