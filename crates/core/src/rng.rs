//! RNG module - seeded gameplay randomness
//!
//! Every random draw that affects the simulation (row fills, garbage slots,
//! conversions, AI sampling) goes through a [`GameRandom`] owned by its
//! caller. Two values created with the same seed produce the same stream.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct GameRandom {
    seed: u64,
    rng: StdRng,
}

impl GameRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from `seed`; draws after this match a fresh `GameRandom::new(seed)`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Integer in `[min, max)`; returns `min` when the range is empty.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Index in `[min, max)`; returns `min` when the range is empty.
    pub fn range_usize(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// True with probability `p` (clamped to `[0, 1]`)
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen::<f32>() < p
    }

    /// Random cell inside a `width` x `height` area
    pub fn point(&mut self, width: usize, height: usize) -> (i32, i32) {
        (
            self.range_usize(0, width) as i32,
            self.range_usize(0, height) as i32,
        )
    }

    /// Index drawn proportionally to `weights`; None when no weight is positive.
    pub fn weighted(&mut self, weights: &[f32]) -> Option<usize> {
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.rng);
    }

    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.rng)
    }
}

impl Default for GameRandom {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = GameRandom::new(42);
        let mut b = GameRandom::new(42);
        for _ in 0..100 {
            assert_eq!(a.range_i32(0, 1000), b.range_i32(0, 1000));
        }
    }

    #[test]
    fn reseed_restarts_the_stream() {
        let mut a = GameRandom::new(7);
        let first: Vec<i32> = (0..10).map(|_| a.range_i32(0, 100)).collect();
        a.range_i32(0, 100);
        a.reseed(7);
        let again: Vec<i32> = (0..10).map(|_| a.range_i32(0, 100)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn empty_ranges_return_min() {
        let mut r = GameRandom::new(1);
        assert_eq!(r.range_i32(5, 5), 5);
        assert_eq!(r.range_usize(3, 1), 3);
        assert_eq!(r.range_f32(2.0, 2.0), 2.0);
    }

    #[test]
    fn chance_extremes() {
        let mut r = GameRandom::new(9);
        assert!(!r.chance(0.0));
        assert!(r.chance(1.0));
    }

    #[test]
    fn weighted_skips_zero_weights() {
        let mut r = GameRandom::new(3);
        for _ in 0..50 {
            assert_eq!(r.weighted(&[0.0, 2.0, 0.0]), Some(1));
        }
        assert_eq!(r.weighted(&[0.0, 0.0]), None);
        assert_eq!(r.weighted(&[]), None);
    }

    #[test]
    fn point_stays_in_bounds() {
        let mut r = GameRandom::new(11);
        for _ in 0..200 {
            let (x, y) = r.point(6, 12);
            assert!((0..6).contains(&x));
            assert!((0..12).contains(&y));
        }
    }

    #[test]
    fn shuffle_keeps_elements() {
        let mut r = GameRandom::new(5);
        let mut v: Vec<u8> = (0..10).collect();
        r.shuffle(&mut v);
        v.sort_unstable();
        assert_eq!(v, (0..10).collect::<Vec<u8>>());
        assert!(r.choose::<u8>(&[]).is_none());
    }
}
