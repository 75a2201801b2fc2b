//! Shared randomness for endpoint selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Mutex;

/// Random source used by directory snapshots.
///
/// Implementations must be safe to call from many threads at once.
pub trait Rand: Send + Sync + fmt::Debug {
    /// Return a value in `0..n`. `n` is never zero.
    fn int(&self, n: usize) -> usize;
}

/// A single generator serialized behind a mutex.
#[derive(Debug)]
pub struct LockedRand {
    rng: Mutex<StdRng>,
}

impl LockedRand {
    /// Seed from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for reproducible selection.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for LockedRand {
    fn default() -> Self {
        Self::new()
    }
}

impl Rand for LockedRand {
    fn int(&self, n: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..n)
    }
}
