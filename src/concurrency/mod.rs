//! Concurrency primitives shared by the kernels.
//!
//! Important: none of these types lock. They let unsynchronized worker threads
//! build shared results by (a) claiming slots with compare-and-swap, (b) setting
//! bits with word-level atomics, and (c) reserving append ranges with one
//! fetch-and-add per batch. Cross-round visibility comes from the fork/join
//! boundary of each parallel loop.

pub mod atomic;
pub mod worklist;

pub use atomic::{AtomicBitmap, AtomicValue};
pub use worklist::{QueueBuffer, SlidingQueue};
