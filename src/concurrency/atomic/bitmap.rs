//! Word-packed bitmap whose bits can be set concurrently.
//!
//! This is the dense alternative to `Vec<AtomicBool>` used for BFS frontiers and
//! Brandes successor flags. Positions are fixed at construction; the bitmap never
//! grows.

use core::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-size bit vector backed by `AtomicU64` words.
pub struct AtomicBitmap {
    bits: usize,
    words: Box<[AtomicU64]>,
}

impl AtomicBitmap {
    /// Creates a bitmap of `bits` positions, all cleared.
    pub fn new(bits: usize) -> Self {
        let words = (0..bits.div_ceil(WORD_BITS)).map(|_| AtomicU64::new(0)).collect();
        Self { bits, words }
    }

    /// Number of addressable positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Returns `true` if the bitmap has no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Clears every bit.
    ///
    /// Large bitmaps are cleared in parallel on the current rayon pool.
    pub fn reset(&self) {
        if self.words.len() >= 1 << 14 {
            self.words.par_iter().for_each(|w| w.store(0, Ordering::Relaxed));
        } else {
            for w in self.words.iter() {
                w.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Sets `pos` with a plain load/store of its word.
    ///
    /// This is not safe against a concurrent writer to the *same word*: one of the
    /// two updates may be lost. Callers that split work on word boundaries (multiples
    /// of 64 positions) can use it from many threads.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn set_bit(&self, pos: usize) {
        let (word, mask) = self.locate(pos);
        let w = &self.words[word];
        w.store(w.load(Ordering::Relaxed) | mask, Ordering::Relaxed);
    }

    /// Sets `pos` safely under concurrent calls on arbitrary positions.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn set_bit_atomic(&self, pos: usize) {
        let (word, mask) = self.locate(pos);
        self.words[word].fetch_or(mask, Ordering::Relaxed);
    }

    /// Returns whether `pos` is set.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn get_bit(&self, pos: usize) -> bool {
        let (word, mask) = self.locate(pos);
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    /// Merges `other` into `self` word by word.
    ///
    /// Takes `&mut self`, so no writer can race with the merge.
    ///
    /// # Panics
    /// Panics if the sizes differ.
    pub fn or_in(&mut self, other: &AtomicBitmap) {
        assert_eq!(self.bits, other.bits, "bitmap sizes differ");
        for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
            *dst.get_mut() |= src.load(Ordering::Relaxed);
        }
    }

    /// Exchanges backing storage with `other` in O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut AtomicBitmap) {
        core::mem::swap(self, other);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    #[inline(always)]
    fn locate(&self, pos: usize) -> (usize, u64) {
        assert!(pos < self.bits, "bit {pos} out of bounds for len {}", self.bits);
        (pos / WORD_BITS, 1u64 << (pos % WORD_BITS))
    }
}

impl core::fmt::Debug for AtomicBitmap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicBitmap")
            .field("bits", &self.bits)
            .field("ones", &self.count_ones())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_in_merges_words() {
        let mut a = AtomicBitmap::new(130);
        let b = AtomicBitmap::new(130);
        a.set_bit(1);
        b.set_bit(129);
        b.set_bit(64);
        a.or_in(&b);
        assert!(a.get_bit(1) && a.get_bit(64) && a.get_bit(129));
        assert_eq!(a.count_ones(), 3);
        assert!(!b.get_bit(1));
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = AtomicBitmap::new(10);
        let mut b = AtomicBitmap::new(10);
        a.set_bit(3);
        a.swap(&mut b);
        assert!(!a.get_bit(3));
        assert!(b.get_bit(3));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_bit_rejects_out_of_range() {
        AtomicBitmap::new(8).get_bit(8);
    }
}
