//! Division-free reduction of monotonic cursors to slot indices.
//!
//! The inbox cursors are plain 64-bit counters that only move forward; the
//! slot index is the counter value modulo the capacity. The reduction uses a
//! precomputed reciprocal instead of a division (from the paper *Faster
//! Remainder by Direct Computation*, Lemire et al.): for `n > 0` and
//! `r = floor(2^64 / n) + 1`, the value `(((c * r) as u128) * n) >> 64`
//! equals `c % n`. Capacities are powers of two, which divide 2^64, so the
//! identity holds for every counter value and the cursors wrap at 2^64
//! without a seam.

/// Reduces absolute cursor values to slot indices for one fixed capacity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotIndexer {
    capacity: u64,
    reciprocal: u64,
}

impl SlotIndexer {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 2 && capacity.is_power_of_two());
        let capacity = capacity as u64;
        Self {
            capacity,
            reciprocal: u64::MAX / capacity + 1,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Reduce an absolute cursor value to a slot index.
    #[inline(always)]
    pub(crate) fn index_of(&self, counter: u64) -> usize {
        let low_bits = counter.wrapping_mul(self.reciprocal);
        (((low_bits as u128) * (self.capacity as u128)) >> 64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_matches_modulo_for_small_counters() {
        for &capacity in &[2usize, 4, 8, 512, 1 << 20] {
            let indexer = SlotIndexer::new(capacity);
            for counter in 0..4096u64 {
                assert_eq!(indexer.index_of(counter), (counter % (capacity as u64)) as usize);
            }
        }
    }

    #[test]
    fn test_wraps_without_a_seam() {
        let indexer = SlotIndexer::new(4);
        assert_eq!(indexer.index_of(u64::MAX), 3);
        assert_eq!(indexer.index_of(u64::MAX.wrapping_add(1)), 0);
    }

    proptest! {
        #[test]
        fn prop_matches_modulo(counter: u64, shift in 1u32..=32) {
            let capacity = 1usize << shift;
            let indexer = SlotIndexer::new(capacity);
            prop_assert_eq!(indexer.index_of(counter), (counter % (capacity as u64)) as usize);
        }
    }
}
