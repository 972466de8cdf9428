//! Deterministic simulation-level RNG.
//!
//! Each queue owns one [`SimRng`] seeded from `SimConfig::seed`, so a model
//! that draws all of its randomness from the queue replays identically for a
//! given seed.  Independent streams (one per source of variation) are derived
//! with [`SimRng::child`], which mixes the offset with the 64-bit fractional
//! golden-ratio constant so consecutive offsets land far apart in seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{CoreError, CoreResult, Duration};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded RNG for simulation models.
///
/// Used only in single-threaded contexts, like the queue that owns it.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
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

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Sample an exponentially distributed delay with the given mean.
    ///
    /// Inverse-transform sampling: `-mean * ln(1 - u)` with `u` in `[0, 1)`,
    /// so the logarithm's argument is never zero.  A zero mean yields
    /// [`Duration::ZERO`].
    ///
    /// # Errors
    /// `CoreError::Overflow` if the sample is too large to represent, which
    /// can only happen for means near `f64::MAX` seconds.
    pub fn exponential(&mut self, mean: Duration) -> CoreResult<Duration> {
        let u: f64 = self.0.r#gen();
        let secs = -mean.as_secs() * (1.0 - u).ln();
        if !secs.is_finite() {
            return Err(CoreError::Overflow);
        }
        Duration::from_secs(secs)
    }
}
