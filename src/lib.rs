//! # `gapkern` - Parallel Graph Kernels
//!
//! Shared-memory graph analytics over a compact, read-only adjacency layout:
//! breadth-first search, single-source shortest paths, connected components,
//! betweenness centrality, PageRank, and triangle counting, plus the loaders,
//! generators, and oracles needed to benchmark them.
//!
//! ## Concurrency Model
//!
//! ### Single Winner Per Slot
//! - **Sentinel claiming**: per-vertex state (parent, distance, depth, label) starts
//!   at a sentinel and is moved off it by compare-and-swap, so exactly one worker
//!   wins each transition.
//! - **Round barriers**: every kernel is a sequence of rayon parallel loops; the end
//!   of a loop is the barrier that publishes one round's writes to the next.
//! - **Read-only graph**: kernels never mutate the graph and need no locks on it.
//!
//! ### Plain Arrays, Atomic Views
//! Kernel state lives in ordinary [`ParallelVector`]s. A parallel region borrows
//! `as_atomic()` to get a same-layout atomic view, so no per-element atomic types
//! leak into the public results.
//!
//! ## Architecture
//!
//! 1. **Primitives** (`concurrency`, `collections`):
//!    - [`AtomicBitmap`]: word-packed bitmap with racy and atomic setters
//!    - [`SlidingQueue`] / [`QueueBuffer`]: level-synchronous frontier with
//!      thread-local batching
//!    - [`ParallelVector`]: uninitialized-capable buffer with parallel fill and
//!      atomic append
//!
//! 2. **Graphs** (`graph`):
//!    - [`CompactGraph`]: offsets plus neighbor array, with a reverse structure for
//!      directed graphs
//!    - [`Builder`]: edge list to graph (degree count, prefix sum, scatter, squish)
//!    - [`Generator`]: uniform and Kronecker synthetic graphs
//!    - `graph::io`: text and serialized readers and writers
//!
//! 3. **Kernels** (`algo`): one module per kernel, each with a serde config struct.
//!
//! 4. **Harness** (`benchmark`, `verify`): source selection, timed trials, serial oracles.
//!
//! ## Example
//!
//! ```rust
//! use gapkern::algo::{direction_optimizing_bfs, BfsConfig};
//! use gapkern::graph::Builder;
//!
//! let g = Builder::new().build::<i32>(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
//! let parent = direction_optimizing_bfs(&g, 0, &BfsConfig::default());
//! assert_eq!(parent.as_slice(), &[0, 0, 1, 2, 3]);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod algo;
pub mod benchmark;
pub mod collections;
pub mod concurrency;
pub mod error;
pub mod graph;
pub mod verify;

pub use collections::ParallelVector;
pub use concurrency::{AtomicBitmap, AtomicValue, QueueBuffer, SlidingQueue};
pub use error::{GraphError, Result};
pub use graph::{Builder, CompactGraph, Destination, Generator, NodeId, Weight, WeightedNode};

// Atomic views reinterpret plain slices in place.
const _: () = {
    use core::mem;
    use core::sync::atomic::{AtomicI32, AtomicU64};

    assert!(mem::size_of::<i32>() == mem::size_of::<AtomicI32>());
    assert!(mem::align_of::<u64>() == mem::align_of::<AtomicU64>());
    assert!(mem::size_of::<WeightedNode<i32, i32>>() == 8);
};
