//! Lock-free atomic building blocks.
//!
//! Important:
//! - Atomic RMW operations have inherent hardware cost; kernels use them only to
//!   claim a slot's transition out of its sentinel value.
//! - Everything else goes through relaxed loads/stores, with rayon's fork/join
//!   boundaries acting as the round barrier.

/// Word-packed concurrent bitmap.
pub mod bitmap;
/// Plain-value to atomic-cell mapping.
pub mod value;

pub use bitmap::AtomicBitmap;
pub use value::AtomicValue;
