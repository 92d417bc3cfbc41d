//! Growable buffers for parallel kernels.

/// Parallel-initialized vector with atomic append reservation.
pub mod parallel_vec;

pub use parallel_vec::ParallelVector;
