//! Strategy traits controlling slot selection and growth.
//!
//! A table is parameterized by three independent policies:
//!
//! - [`RangeHashing`] turns a 64-bit hash into the first slot of a probe
//!   sequence.
//! - [`CollisionPolicy`] produces the following slots of that sequence.
//! - [`RehashPolicy`] decides when the table grows and to what size.
//!
//! All of them are stateless and resolved at compile time. Each can be
//! replaced without touching the other two, e.g. `HashMap<K, V, S,
//! QuadraticProbing>` swaps only the probing strategy.

/// Maps a hash value into the slot range of a table.
pub trait RangeHashing {
    /// Reduce `hash` to an index in `0..buckets`.
    ///
    /// `buckets` is the table size as produced by the [`RehashPolicy`].
    fn reduce(hash: u64, buckets: usize) -> usize;
}

/// Produces successive candidate slots after a collision.
pub trait CollisionPolicy {
    /// Returns the slot probed at `step` (starting from 1) for a sequence
    /// that began at `start`. The result must lie in `0..buckets`.
    ///
    /// Together with `start` itself (step 0), steps `1..buckets` must visit
    /// every slot exactly once for the table sizes the [`RehashPolicy`]
    /// produces.
    fn next(start: usize, step: usize, buckets: usize) -> usize;
}

/// Controls the growth schedule of a table.
pub trait RehashPolicy {
    /// Smallest table the policy ever allocates.
    const MIN_BUCKETS: usize = 64;

    /// The load factor the table is kept at or below.
    fn max_load_factor() -> f32;

    /// Returns `true` if holding `len` entries in `buckets` slots exceeds the
    /// maximum load factor.
    fn need_rehash(len: usize, buckets: usize) -> bool;

    /// Number of slots wanted to hold `desired` entries.
    fn buckets_for(desired: usize) -> usize;

    /// Smallest valid table size that is at least `desired` and at least
    /// `floor`.
    fn round_up_pow2(desired: usize, floor: usize) -> usize;
}

/// Reduces hashes with a bitmask. Requires power-of-two table sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskRangeHashing;

impl RangeHashing for MaskRangeHashing {
    #[inline(always)]
    fn reduce(hash: u64, buckets: usize) -> usize {
        debug_assert!(buckets.is_power_of_two());
        (hash as usize) & (buckets - 1)
    }
}

/// Probes `start + step`. Cheap, but prone to primary clustering.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearProbing;

impl CollisionPolicy for LinearProbing {
    #[inline(always)]
    fn next(start: usize, step: usize, buckets: usize) -> usize {
        start.wrapping_add(step) & (buckets - 1)
    }
}

/// Probes with quadratically growing strides.
///
/// For power-of-two sizes the offset is the triangular number
/// `(step² + step) / 2`, which is a permutation of the slots. Plain `step²`
/// would revisit a fraction of them and cycle. Other sizes fall back to
/// `step²` modulo the size.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticProbing;

impl CollisionPolicy for QuadraticProbing {
    #[inline(always)]
    fn next(start: usize, step: usize, buckets: usize) -> usize {
        if buckets.is_power_of_two() {
            let triangular = step.wrapping_mul(step).wrapping_add(step) >> 1;
            return start.wrapping_add(triangular) & (buckets - 1);
        }
        start.wrapping_add(step.wrapping_mul(step)) % buckets
    }
}

/// Power-of-two growth with a fixed 0.5 load factor and a 64 slot minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Power2RehashPolicy;

impl RehashPolicy for Power2RehashPolicy {
    #[inline(always)]
    fn max_load_factor() -> f32 {
        0.5
    }

    #[inline(always)]
    fn need_rehash(len: usize, buckets: usize) -> bool {
        len > (buckets >> 1)
    }

    #[inline(always)]
    fn buckets_for(desired: usize) -> usize {
        desired.checked_mul(2).unwrap_or_else(|| capacity_overflow())
    }

    #[inline]
    fn round_up_pow2(desired: usize, floor: usize) -> usize {
        desired
            .max(floor)
            .checked_next_power_of_two()
            .unwrap_or_else(|| capacity_overflow())
    }
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    fn collect_sequence<P: CollisionPolicy>(start: usize, buckets: usize) -> Vec<usize> {
        let mut seq = vec![start];
        for step in 1..buckets {
            seq.push(P::next(start, step, buckets));
        }
        seq
    }

    fn is_permutation(mut seq: Vec<usize>, buckets: usize) -> bool {
        seq.sort_unstable();
        seq.dedup();
        seq.len() == buckets && seq.iter().all(|&i| i < buckets)
    }

    #[test]
    fn mask_reduction_stays_in_range() {
        for buckets in [64usize, 128, 1024] {
            for hash in [0u64, 1, 63, 64, 65, u64::MAX, 0xDEAD_BEEF] {
                let idx = MaskRangeHashing::reduce(hash, buckets);
                assert!(idx < buckets);
                assert_eq!(idx, (hash % buckets as u64) as usize);
            }
        }
    }

    #[test]
    fn linear_probing_wraps() {
        assert_eq!(LinearProbing::next(0, 1, 64), 1);
        assert_eq!(LinearProbing::next(62, 1, 64), 63);
        assert_eq!(LinearProbing::next(63, 1, 64), 0);
        assert_eq!(LinearProbing::next(63, 3, 64), 2);
    }

    #[test]
    fn linear_probing_visits_every_slot() {
        for start in [0usize, 17, 63] {
            assert!(is_permutation(collect_sequence::<LinearProbing>(start, 64), 64));
        }
    }

    #[test]
    fn quadratic_probing_uses_triangular_offsets() {
        assert_eq!(QuadraticProbing::next(0, 1, 64), 1);
        assert_eq!(QuadraticProbing::next(0, 2, 64), 3);
        assert_eq!(QuadraticProbing::next(0, 3, 64), 6);
        assert_eq!(QuadraticProbing::next(0, 4, 64), 10);
        assert_eq!(QuadraticProbing::next(60, 4, 64), 6);
    }

    #[test]
    fn quadratic_probing_visits_every_slot_for_powers_of_two() {
        for buckets in [64usize, 128, 256, 4096] {
            for start in [0usize, 1, buckets / 3, buckets - 1] {
                assert!(
                    is_permutation(collect_sequence::<QuadraticProbing>(start, buckets), buckets),
                    "start {start} buckets {buckets}"
                );
            }
        }
    }

    #[test]
    fn quadratic_probing_falls_back_to_squares() {
        assert_eq!(QuadraticProbing::next(0, 2, 10), 4);
        assert_eq!(QuadraticProbing::next(5, 3, 10), 4);
        for step in 1..50 {
            assert!(QuadraticProbing::next(7, step, 11) < 11);
        }
    }

    #[test]
    fn rehash_threshold_is_half() {
        assert_eq!(Power2RehashPolicy::max_load_factor(), 0.5);
        assert!(!Power2RehashPolicy::need_rehash(32, 64));
        assert!(Power2RehashPolicy::need_rehash(33, 64));
        assert!(!Power2RehashPolicy::need_rehash(0, 64));
    }

    #[test]
    fn bucket_sizing() {
        assert_eq!(Power2RehashPolicy::buckets_for(0), 0);
        assert_eq!(Power2RehashPolicy::buckets_for(33), 66);
        assert_eq!(Power2RehashPolicy::round_up_pow2(0, 64), 64);
        assert_eq!(Power2RehashPolicy::round_up_pow2(64, 64), 64);
        assert_eq!(Power2RehashPolicy::round_up_pow2(65, 64), 128);
        assert_eq!(Power2RehashPolicy::round_up_pow2(66, 64), 128);
        assert_eq!(Power2RehashPolicy::round_up_pow2(10, 256), 256);
        assert_eq!(Power2RehashPolicy::round_up_pow2(1000, 64), 1024);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn bucket_sizing_overflow_panics() {
        Power2RehashPolicy::round_up_pow2(usize::MAX, 64);
    }
}
