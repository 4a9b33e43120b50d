//! Single source of randomness for content selection.

use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Uniform index selection over a pool of `pool_size` elements.
///
/// Returns `None` for an empty pool; otherwise every index in
/// `[0, pool_size)` is equally likely.
pub trait UniformPicker: Send + Sync {
    fn pick(&self, pool_size: usize) -> Option<usize>;
}

/// `UniformPicker` backed by a `StdRng`.
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picker; the same seed yields the same selection sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl UniformPicker for RandomPicker {
    fn pick(&self, pool_size: usize) -> Option<usize> {
        if pool_size == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        Some(rng.gen_range(0..pool_size))
    }
}
