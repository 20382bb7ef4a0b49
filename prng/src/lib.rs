// Deterministic linear-congruential generator.
//
// Critical constraint: determinism. Given the same seed, `Lcg` must produce
// the exact same sequence of values on every platform and every run, forever.
// This rules out the external `rand` crate (whose algorithms and even trait
// defaults can shift between versions) in favour of a small, frozen,
// hand-rolled generator that we own and never change.
//
// The recurrence is the classic Numerical Recipes LCG:
//
//   s <- (1664525 * s + 1013904223) mod 2^32
//
// It is not cryptographically strong and is not meant to be; it exists only
// to drive the stochastic local search with a reproducible, auditable stream
// of numbers.

use serde::{Deserialize, Serialize};

const LCG_A: u32 = 1664525;
const LCG_C: u32 = 1013904223;

/// A 32-bit linear-congruential generator.
///
/// `Lcg` is `Copy` and tiny; clone it freely to fork independent streams from
/// a shared seed, or serialize it to snapshot search state mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Creates a generator seeded with `seed`.
    pub fn new(seed: u32) -> Self {
        Lcg { state: seed }
    }

    /// Advances the state and returns the new raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_A).wrapping_add(LCG_C);
        self.state
    }

    /// Returns a value in `[0, 1)`, advancing the state once.
    pub fn random_double(&mut self) -> f64 {
        self.next_u32() as f64 / 4294967296.0_f64
    }

    /// Returns an integer in `[min, max)`, advancing the state once.
    ///
    /// If `min == max` the draw is skipped and `min` is returned directly —
    /// matching the reference generator, which treats a zero-width range as
    /// a no-op rather than a modulo-by-zero error.
    pub fn random_range(&mut self, min: i64, max: i64) -> i64 {
        if min == max {
            return min;
        }
        let span = (max - min) as u64;
        let draw = self.next_u32() as u64 % span;
        min + draw as i64
    }

    /// Returns an index in `[min, max)`, advancing the state once.
    pub fn random_range_usize(&mut self, min: usize, max: usize) -> usize {
        self.random_range(min as i64, max as i64) as usize
    }

    /// Returns the raw internal state, for diagnostics and snapshotting.
    pub fn state(&self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = Lcg::new(1);
        let mut b = Lcg::new(2);
        assert_ne!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn known_sequence_from_seed_zero() {
        let mut rng = Lcg::new(0);
        assert_eq!(rng.next_u32(), 1013904223);
        assert_eq!(rng.next_u32(), 1196435762);
        assert_eq!(rng.next_u32(), 3519870697);
    }

    #[test]
    fn random_double_in_unit_range() {
        let mut rng = Lcg::new(7);
        for _ in 0..1000 {
            let v = rng.random_double();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn random_range_within_bounds() {
        let mut rng = Lcg::new(99);
        for _ in 0..1000 {
            let v = rng.random_range(10, 20);
            assert!((10..20).contains(&v));
        }
    }

    #[test]
    fn random_range_degenerate_is_noop() {
        let mut rng = Lcg::new(5);
        let before = rng.state();
        assert_eq!(rng.random_range(3, 3), 3);
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn random_range_usize_within_bounds() {
        let mut rng = Lcg::new(3);
        for _ in 0..1000 {
            let v = rng.random_range_usize(0, 6);
            assert!(v < 6);
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let rng = Lcg::new(12345);
        let json = serde_json::to_string(&rng).unwrap();
        let back: Lcg = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, back);
    }
}
