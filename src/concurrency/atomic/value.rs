//! Plain values with a same-layout hardware atomic.
//!
//! Kernels keep their per-vertex state in ordinary arrays (`ParallelVector<T>`) and
//! borrow an atomic view of them for the duration of a parallel region. This trait
//! provides the mapping from a plain element type to its atomic twin plus the
//! handful of read-modify-write operations the kernels need.

use core::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// A `Copy` value that shares size and alignment with an atomic cell type.
///
/// # Safety
/// Implementors must guarantee that `Self::Atomic` has exactly the same size and
/// alignment as `Self`, and that every bit pattern of `Self` is a valid
/// `Self::Atomic` (and vice versa). `ParallelVector::as_atomic` reinterprets a
/// `&mut [Self]` as `&[Self::Atomic]` based on this promise.
pub unsafe trait AtomicValue: Copy + Send + Sync + 'static {
    /// The atomic cell that stores a `Self`.
    type Atomic: Send + Sync;

    /// Wraps a value in a fresh atomic cell.
    fn new_atomic(value: Self) -> Self::Atomic;

    /// Loads the current value.
    fn load(cell: &Self::Atomic, order: Ordering) -> Self;

    /// Stores a new value.
    fn store(cell: &Self::Atomic, value: Self, order: Ordering);

    /// Stores `new` if the cell still holds `current`.
    ///
    /// Returns `Ok(previous)` on success and `Err(actual)` on failure.
    fn compare_exchange(
        cell: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;

    /// Adds `value` to the cell, returning the previous value.
    fn fetch_add(cell: &Self::Atomic, value: Self, order: Ordering) -> Self;

    /// `compare_exchange` with relaxed ordering on both paths.
    ///
    /// Kernels rely on the round barrier for cross-thread visibility, so the
    /// claim CAS itself needs no ordering.
    #[inline(always)]
    fn compare_exchange_relaxed(cell: &Self::Atomic, current: Self, new: Self) -> Result<Self, Self> {
        Self::compare_exchange(cell, current, new, Ordering::Relaxed, Ordering::Relaxed)
    }
}

macro_rules! impl_atomic_int {
    ($($t:ty => $a:ty),* $(,)?) => {
        $(
            const _: () = {
                assert!(core::mem::size_of::<$t>() == core::mem::size_of::<$a>());
                assert!(core::mem::align_of::<$t>() == core::mem::align_of::<$a>());
            };

            // SAFETY: size and alignment checked at compile time above; integers and
            // their atomics accept every bit pattern.
            unsafe impl AtomicValue for $t {
                type Atomic = $a;

                #[inline(always)]
                fn new_atomic(value: Self) -> Self::Atomic {
                    <$a>::new(value)
                }

                #[inline(always)]
                fn load(cell: &Self::Atomic, order: Ordering) -> Self {
                    cell.load(order)
                }

                #[inline(always)]
                fn store(cell: &Self::Atomic, value: Self, order: Ordering) {
                    cell.store(value, order);
                }

                #[inline(always)]
                fn compare_exchange(
                    cell: &Self::Atomic,
                    current: Self,
                    new: Self,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<Self, Self> {
                    cell.compare_exchange(current, new, success, failure)
                }

                #[inline(always)]
                fn fetch_add(cell: &Self::Atomic, value: Self, order: Ordering) -> Self {
                    cell.fetch_add(value, order)
                }
            }
        )*
    };
}

impl_atomic_int!(i32 => AtomicI32, u32 => AtomicU32, usize => AtomicUsize);

#[cfg(target_pointer_width = "64")]
impl_atomic_int!(i64 => AtomicI64, u64 => AtomicU64);

macro_rules! impl_atomic_float {
    ($($t:ty => $a:ty),* $(,)?) => {
        $(
            const _: () = {
                assert!(core::mem::size_of::<$t>() == core::mem::size_of::<$a>());
                assert!(core::mem::align_of::<$t>() == core::mem::align_of::<$a>());
            };

            // SAFETY: floats are stored through their IEEE bit pattern in the
            // same-width unsigned atomic; layout checked at compile time above.
            unsafe impl AtomicValue for $t {
                type Atomic = $a;

                #[inline(always)]
                fn new_atomic(value: Self) -> Self::Atomic {
                    <$a>::new(value.to_bits())
                }

                #[inline(always)]
                fn load(cell: &Self::Atomic, order: Ordering) -> Self {
                    <$t>::from_bits(cell.load(order))
                }

                #[inline(always)]
                fn store(cell: &Self::Atomic, value: Self, order: Ordering) {
                    cell.store(value.to_bits(), order);
                }

                #[inline(always)]
                fn compare_exchange(
                    cell: &Self::Atomic,
                    current: Self,
                    new: Self,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<Self, Self> {
                    cell.compare_exchange(current.to_bits(), new.to_bits(), success, failure)
                        .map(<$t>::from_bits)
                        .map_err(<$t>::from_bits)
                }

                /// Float addition has no hardware RMW; this retries a CAS on the bit pattern.
                #[inline]
                fn fetch_add(cell: &Self::Atomic, value: Self, order: Ordering) -> Self {
                    let prev = cell
                        .fetch_update(order, Ordering::Relaxed, |bits| {
                            Some((<$t>::from_bits(bits) + value).to_bits())
                        })
                        .unwrap_or_else(|bits| bits);
                    <$t>::from_bits(prev)
                }
            }
        )*
    };
}

impl_atomic_float!(f32 => AtomicU32);

#[cfg(target_pointer_width = "64")]
impl_atomic_float!(f64 => AtomicU64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_fetch_add_accumulates() {
        let cell = f32::new_atomic(1.5);
        let prev = f32::fetch_add(&cell, 2.0, Ordering::Relaxed);
        assert_eq!(prev, 1.5);
        assert_eq!(f32::load(&cell, Ordering::Relaxed), 3.5);
    }

    #[test]
    fn int_compare_exchange_reports_actual() {
        let cell = i32::new_atomic(-4);
        assert_eq!(i32::compare_exchange_relaxed(&cell, -4, 7), Ok(-4));
        assert_eq!(i32::compare_exchange_relaxed(&cell, -4, 9), Err(7));
    }
}
