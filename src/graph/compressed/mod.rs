//! Compressed graph representations.
//!
//! Kernels consume the read-only CSR layout in `compact_graph`; everything else in
//! `graph` exists to produce one.

pub mod compact_graph;

pub use compact_graph::CompactGraph;
