//! Randomness source for draws

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random number provider used by the engine.
///
/// Implement this to script outcomes and jitter in tests.
pub trait DrawRng: Send {
    /// Uniform index in `0..len` (`len >= 1`)
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform value in `[0, max_ms)`, or 0 when `max_ms <= 0`
    fn jitter_ms(&mut self, max_ms: f64) -> f64;
}

/// Seedable ChaCha8 generator
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededRng {
    /// Reproducible generator
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from the thread RNG
    pub fn from_entropy() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// Seed this generator started from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl DrawRng for SeededRng {
    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.random_range(0..len)
    }

    fn jitter_ms(&mut self, max_ms: f64) -> f64 {
        if !max_ms.is_finite() || max_ms <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(0.0..max_ms)
    }
}
