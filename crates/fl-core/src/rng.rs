//! Deterministic per-unit RNG for generator wares.
//!
//! A generator that draws inside `par_for_each_unit` cannot share one RNG
//! across units: the draw order would follow thread scheduling.  Instead it
//! builds a fresh [`UnitRng`] per (seed, step, unit) triple:
//!
//! | Constructor            | Stream depends on      |
//! |------------------------|------------------------|
//! | [`UnitRng::new`]       | seed, unit slot        |
//! | [`UnitRng::at_step`]   | seed, step, unit slot  |
//!
//! Slot and step are folded into the seed with the golden-ratio constant, so
//! neighbouring slots and consecutive steps land far apart in seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{Step, UnitIndex};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-unit deterministic RNG.
pub struct UnitRng(SmallRng);

impl UnitRng {
    pub fn new(seed: u64, unit: UnitIndex) -> Self {
        Self::from_mixed(seed ^ (unit.0 as u64).wrapping_mul(MIXING_CONSTANT))
    }

    /// Stream for one unit at one step.  Two steps of the same unit never
    /// share a stream.
    pub fn at_step(seed: u64, step: Step, unit: UnitIndex) -> Self {
        let step_seed = seed ^ step.0.wrapping_add(1).wrapping_mul(MIXING_CONSTANT).rotate_left(29);
        Self::new(step_seed, unit)
    }

    fn from_mixed(seed: u64) -> Self {
        UnitRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Uniform real in `[low, high)`; `low` when the interval is empty.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low { self.0.gen_range(low..high) } else { low }
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
