//! Frontier worklists for level-synchronous traversals.

/// Sliding-window queue with thread-local batching buffers.
pub mod sliding_queue;

pub use sliding_queue::{QueueBuffer, SlidingQueue};
