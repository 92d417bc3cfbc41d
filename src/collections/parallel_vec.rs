//! `ParallelVector`: a growable array that never initializes behind your back.
//!
//! Goals:
//! - construction and growth cost proportional to the allocation, not to a
//!   serial initialization pass (fills run in parallel on the rayon pool)
//! - one contiguous buffer so kernels can take atomic views of whole arrays
//! - a lock-free append path (`push_atomic` / `extend_atomic`) whose writes only
//!   become part of the vector after an explicit `publish`
//!
//! Storage is `UnsafeCell<MaybeUninit<T>>` so that `&self` appends can write into
//! the reserved tail while readers hold `&[T]` over the published prefix.
//! Elements `[0, len)` are always initialized; the tail `[len, capacity)` is not.

use core::{
    cell::UnsafeCell,
    fmt,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
    ptr, slice,
    sync::atomic::{AtomicUsize, Ordering},
};

use crossbeam_utils::CachePadded;
use rayon::prelude::*;

use crate::concurrency::atomic::AtomicValue;

/// Below this many elements, fills and copies stay on the calling thread.
const PAR_THRESHOLD: usize = 1 << 14;

/// Growth factor used by `push` when the buffer is full.
const GROWTH_FACTOR: usize = 2;

/// A vector with uninitialized-on-resize semantics and parallel bulk operations.
pub struct ParallelVector<T: Copy> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    len: usize,
    /// Next free slot for `&self` appends; equals `len` whenever no append is pending.
    /// Padded so appending threads do not share a line with `slots` and `len`.
    reserved: CachePadded<AtomicUsize>,
}

// SAFETY: the vector owns its `T`s.
unsafe impl<T: Copy + Send> Send for ParallelVector<T> {}
// SAFETY: shared access hands out `&T` for `[0, len)` (needs `T: Sync`) and moves
// `T` values into disjoint, atomically reserved slots of the tail (needs `T: Send`).
unsafe impl<T: Copy + Send + Sync> Sync for ParallelVector<T> {}

#[allow(clippy::uninit_vec)]
fn alloc_slots<T>(capacity: usize) -> Box<[UnsafeCell<MaybeUninit<T>>]> {
    let mut v: Vec<UnsafeCell<MaybeUninit<T>>> = Vec::with_capacity(capacity);
    // SAFETY: `UnsafeCell<MaybeUninit<T>>` has no validity requirement.
    unsafe { v.set_len(capacity) };
    v.into_boxed_slice()
}

impl<T: Copy> ParallelVector<T> {
    /// Creates an empty vector without allocating.
    pub fn new() -> Self {
        Self {
            slots: Box::new([]),
            len: 0,
            reserved: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Creates an empty vector with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: alloc_slots(capacity),
            len: 0,
            reserved: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a vector of `len` elements without initializing them.
    ///
    /// # Safety
    /// Every element must be written (e.g. via `as_mut_ptr` or `fill`) before it is
    /// read through the slice view.
    pub unsafe fn uninit(len: usize) -> Self {
        Self {
            slots: alloc_slots(len),
            len,
            reserved: CachePadded::new(AtomicUsize::new(len)),
        }
    }

    /// Number of published elements.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no element is published.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drops all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
        *self.reserved.get_mut() = 0;
    }

    /// Shortens the vector to `len` elements. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            *self.reserved.get_mut() = len;
        }
    }

    /// Sets the published length directly.
    ///
    /// # Safety
    /// `len <= capacity()` and every element below `len` must be initialized.
    pub unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
        *self.reserved.get_mut() = len;
    }

    /// Raw pointer to the first slot.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.slots.as_ptr().cast()
    }

    /// Raw mutable pointer to the first slot.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.slots.as_mut_ptr().cast()
    }

    /// The published elements.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized, and `&self` appends only touch `[len, cap)`.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// The published elements, mutably.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: `[0, len)` is initialized and `&mut self` excludes other access.
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Exchanges contents with `other` in O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut ParallelVector<T>) {
        core::mem::swap(self, other);
    }

    /// Number of slots reserved by `&self` appends (published or not).
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.reserved.load(Ordering::Acquire)
    }

    /// Claims `count` slots of the tail, or `None` if they would run past `capacity()`.
    ///
    /// A refused claim leaves `reserved` untouched, so `reserved <= capacity()` and
    /// every slot below it belongs to a successful claim.
    fn reserve_slots(&self, count: usize) -> Option<usize> {
        let capacity = self.capacity();
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |start| {
                start.checked_add(count).filter(|&end| end <= capacity)
            })
            .ok()
    }

    /// Reserves one slot with a single fetch-and-increment and writes `value` into it.
    ///
    /// The element stays invisible to `as_slice` until `publish` runs. Returns the
    /// reserved index, or gives `value` back if the buffer is full (appends never
    /// reallocate).
    pub fn push_atomic(&self, value: T) -> Result<usize, T> {
        let Some(idx) = self.reserve_slots(1) else {
            return Err(value);
        };
        // SAFETY: `idx` was handed out exactly once and lies in the unpublished tail.
        unsafe { UnsafeCell::raw_get(self.slots.as_ptr().add(idx)).cast::<T>().write(value) };
        Ok(idx)
    }

    /// Reserves `items.len()` contiguous slots with one atomic add, then bulk-copies.
    ///
    /// Returns the first reserved index. Like `push_atomic`, the copy is invisible to
    /// readers until `publish`.
    ///
    /// # Panics
    /// Panics if the reservation would run past `capacity()`. Nothing is reserved in
    /// that case, so a later `publish` still covers only written slots.
    pub fn extend_atomic(&self, items: &[T]) -> usize {
        if items.is_empty() {
            return self.reserved.load(Ordering::Relaxed);
        }
        let Some(start) = self.reserve_slots(items.len()) else {
            panic!(
                "append of {} items overflows capacity {} (reserved up to {})",
                items.len(),
                self.capacity(),
                self.reserved.load(Ordering::Relaxed)
            );
        };
        // SAFETY: `[start, start + len)` is in bounds and reserved exclusively for this call.
        unsafe {
            let dst = UnsafeCell::raw_get(self.slots.as_ptr().add(start)).cast::<T>();
            ptr::copy_nonoverlapping(items.as_ptr(), dst, items.len());
        }
        start
    }

    /// Makes every completed `&self` append part of the vector.
    ///
    /// Requires `&mut self`, which proves all appending threads have finished.
    pub fn publish(&mut self) {
        self.len = *self.reserved.get_mut();
    }
}

impl<T: Copy + Send + Sync> ParallelVector<T> {
    /// Creates a vector of `len` copies of `value`, filled in parallel.
    pub fn filled(len: usize, value: T) -> Self {
        // SAFETY: every slot is written by `fill` before any read.
        let mut v = unsafe { Self::uninit(len) };
        v.fill_slots(0, len, value);
        v
    }

    /// Creates a vector holding a copy of `src`, copied in parallel.
    pub fn from_slice(src: &[T]) -> Self {
        let mut v = Self::with_capacity(src.len());
        if src.len() >= PAR_THRESHOLD {
            v.slots
                .par_iter_mut()
                .zip(src.par_iter())
                .for_each(|(dst, &x)| *dst.get_mut() = MaybeUninit::new(x));
        } else {
            for (dst, &x) in v.slots.iter_mut().zip(src) {
                *dst.get_mut() = MaybeUninit::new(x);
            }
        }
        // SAFETY: all `src.len()` slots were just written.
        unsafe { v.set_len(src.len()) };
        v
    }

    /// Ensures capacity for at least `capacity` total elements.
    ///
    /// Not safe for concurrent callers; `&mut self` enforces that. Existing elements
    /// are copied in parallel; new slots stay uninitialized.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.grow_exact(capacity);
        }
    }

    /// Resizes to `len`, leaving any new slots uninitialized.
    ///
    /// # Safety
    /// Slots between the old and new length must be written before they are read.
    pub unsafe fn resize_uninit(&mut self, len: usize) {
        self.reserve(len);
        self.len = len;
        *self.reserved.get_mut() = len;
    }

    /// Resizes to `len`, writing `value` into any new slots in parallel.
    pub fn resize(&mut self, len: usize, value: T) {
        let old = self.len;
        self.reserve(len);
        if len > old {
            self.fill_slots(old, len, value);
        }
        self.len = len;
        *self.reserved.get_mut() = len;
    }

    /// Writes `value` into every published slot using many threads over disjoint ranges.
    pub fn fill(&mut self, value: T) {
        let len = self.len;
        self.fill_slots(0, len, value);
    }

    fn fill_slots(&mut self, start: usize, end: usize, value: T) {
        let range = &mut self.slots[start..end];
        if range.len() >= PAR_THRESHOLD {
            range
                .par_iter_mut()
                .with_min_len(PAR_THRESHOLD / 4)
                .for_each(|s| *s.get_mut() = MaybeUninit::new(value));
        } else {
            for s in range {
                *s.get_mut() = MaybeUninit::new(value);
            }
        }
    }

    /// Appends `value` from a single thread, growing by doubling when full.
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            let new_cap = if self.capacity() == 0 {
                1
            } else {
                self.capacity() * GROWTH_FACTOR
            };
            self.grow_exact(new_cap);
        }
        // SAFETY: `len < capacity` after the growth above.
        unsafe { self.as_mut_ptr().add(self.len).write(value) };
        self.len += 1;
        *self.reserved.get_mut() = self.len;
    }

    fn grow_exact(&mut self, new_cap: usize) {
        let mut next = alloc_slots::<T>(new_cap);
        let len = self.len;
        let src = self.as_slice();
        if len >= PAR_THRESHOLD {
            next[..len]
                .par_iter_mut()
                .zip(src.par_iter())
                .for_each(|(dst, &v)| *dst.get_mut() = MaybeUninit::new(v));
        } else {
            for (dst, &v) in next[..len].iter_mut().zip(src) {
                *dst.get_mut() = MaybeUninit::new(v);
            }
        }
        self.slots = next;
    }

    /// Converts into a `Vec<T>`, reusing the allocation when it is exactly full.
    pub fn into_vec(self) -> Vec<T> {
        if self.len == self.capacity() {
            let raw = Box::into_raw(self.slots) as *mut [T];
            // SAFETY: every slot is initialized and `UnsafeCell<MaybeUninit<T>>` has
            // the layout of `T`.
            unsafe { Box::from_raw(raw) }.into_vec()
        } else {
            self.as_slice().to_vec()
        }
    }
}

impl<T: AtomicValue> ParallelVector<T> {
    /// Borrows the published elements as atomic cells.
    ///
    /// This is how kernels share one array between worker threads: the exclusive
    /// borrow guarantees no plain reference aliases the atomic view.
    #[inline]
    pub fn as_atomic(&mut self) -> &[T::Atomic] {
        let len = self.len;
        // SAFETY: `AtomicValue` guarantees identical size, alignment and bit validity,
        // and `&mut self` rules out any other live reference into the buffer.
        unsafe { slice::from_raw_parts(self.as_mut_ptr().cast::<T::Atomic>(), len) }
    }
}

impl<T: Copy> Default for ParallelVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Deref for ParallelVector<T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy> DerefMut for ParallelVector<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + Send + Sync> Clone for ParallelVector<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for ParallelVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Copy + PartialEq> PartialEq for ParallelVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy> From<Vec<T>> for ParallelVector<T> {
    fn from(v: Vec<T>) -> Self {
        let boxed = v.into_boxed_slice();
        let len = boxed.len();
        let raw = Box::into_raw(boxed) as *mut [UnsafeCell<MaybeUninit<T>>];
        Self {
            // SAFETY: same layout; the slice length is preserved by the pointer cast.
            slots: unsafe { Box::from_raw(raw) },
            len,
            reserved: CachePadded::new(AtomicUsize::new(len)),
        }
    }
}

impl<T: Copy> FromIterator<T> for ParallelVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<T>>().into()
    }
}

impl<T: Copy + Send> FromParallelIterator<T> for ParallelVector<T> {
    fn from_par_iter<I: IntoParallelIterator<Item = T>>(iter: I) -> Self {
        Vec::from_par_iter(iter).into()
    }
}

impl<'a, T: Copy> IntoIterator for &'a ParallelVector<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests;
