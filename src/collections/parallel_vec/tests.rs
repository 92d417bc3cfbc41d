//! Tests for `ParallelVector`.

use super::*;

#[test]
fn filled_and_fill_cover_every_slot() {
    let mut v = ParallelVector::filled(100_000, 7u32);
    assert_eq!(v.len(), 100_000);
    assert!(v.iter().all(|&x| x == 7));

    v.fill(3);
    assert!(v.iter().all(|&x| x == 3));
}

#[test]
fn push_grows_by_doubling() {
    let mut v = ParallelVector::new();
    for i in 0..10i64 {
        v.push(i);
    }
    assert_eq!(v.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(v.capacity(), 16);
}

#[test]
fn reserve_keeps_contents_and_resize_fills_tail() {
    let mut v: ParallelVector<i32> = vec![1, 2, 3].into();
    v.reserve(50_000);
    assert!(v.capacity() >= 50_000);
    assert_eq!(v.as_slice(), &[1, 2, 3]);

    v.resize(6, -1);
    assert_eq!(v.as_slice(), &[1, 2, 3, -1, -1, -1]);

    v.truncate(2);
    assert_eq!(v.as_slice(), &[1, 2]);
}

#[test]
fn push_atomic_increments_by_one_element() {
    let mut v = ParallelVector::<u64>::with_capacity(4);
    assert_eq!(v.push_atomic(10), Ok(0));
    assert_eq!(v.push_atomic(11), Ok(1));
    assert_eq!(v.push_atomic(12), Ok(2));
    assert!(v.is_empty(), "appends are invisible before publish");

    v.publish();
    assert_eq!(v.as_slice(), &[10, 11, 12]);
}

#[test]
fn push_atomic_reports_full_buffer() {
    let mut v = ParallelVector::<u8>::with_capacity(1);
    assert_eq!(v.push_atomic(1), Ok(0));
    assert_eq!(v.push_atomic(2), Err(2));
    v.publish();
    assert_eq!(v.as_slice(), &[1]);
}

#[test]
fn overflowing_extend_reserves_nothing() {
    let mut v = ParallelVector::<u32>::with_capacity(3);
    assert_eq!(v.extend_atomic(&[10, 11]), 0);

    let overflow = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| v.extend_atomic(&[12, 13])));
    assert!(overflow.is_err());
    assert_eq!(v.pending_len(), 2);

    v.publish();
    assert_eq!(v.as_slice(), &[10, 11]);

    // The refused claim left the last slot free.
    assert_eq!(v.push_atomic(14), Ok(2));
    v.publish();
    assert_eq!(v.as_slice(), &[10, 11, 14]);
}

#[test]
fn failed_push_atomic_keeps_reservation_at_capacity() {
    let mut v = ParallelVector::<u8>::with_capacity(2);
    assert_eq!(v.push_atomic(1), Ok(0));
    assert_eq!(v.push_atomic(2), Ok(1));
    for _ in 0..5 {
        assert_eq!(v.push_atomic(3), Err(3));
    }
    assert_eq!(v.pending_len(), 2);
    v.publish();
    assert_eq!(v.as_slice(), &[1, 2]);
}

#[test]
fn concurrent_extend_atomic_lands_every_item_once() {
    let threads = 8;
    let per_thread = 1000;
    let mut v = ParallelVector::<usize>::with_capacity(threads * per_thread);

    std::thread::scope(|scope| {
        for t in 0..threads {
            let v = &v;
            scope.spawn(move || {
                let batch: Vec<usize> = (0..per_thread).map(|i| t * per_thread + i).collect();
                for chunk in batch.chunks(64) {
                    v.extend_atomic(chunk);
                }
            });
        }
    });

    v.publish();
    let mut seen = v.into_vec();
    seen.sort_unstable();
    assert_eq!(seen, (0..threads * per_thread).collect::<Vec<_>>());
}

#[test]
fn atomic_view_supports_cas_claims() {
    let mut v = ParallelVector::filled(64, -1i32);
    {
        let cells = v.as_atomic();
        std::thread::scope(|scope| {
            for t in 0..4 {
                scope.spawn(move || {
                    for cell in cells {
                        let _ = i32::compare_exchange_relaxed(cell, -1, t);
                    }
                });
            }
        });
    }
    assert!(v.iter().all(|&x| (0..4).contains(&x)));
}

#[test]
fn into_vec_roundtrips_full_and_partial_buffers() {
    let full: ParallelVector<i32> = (0..5).collect();
    assert_eq!(full.into_vec(), vec![0, 1, 2, 3, 4]);

    let mut partial = ParallelVector::with_capacity(8);
    partial.push(9);
    assert_eq!(partial.into_vec(), vec![9]);
}
