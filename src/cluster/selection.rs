//! Selection within one tier of a directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::random::Rand;

/// How an endpoint is picked from the tier being served.
#[derive(Debug, Clone, Default)]
pub enum Selection {
    /// Uniform draw from the directory's random source.
    #[default]
    Random,
    /// Rotate through the tier with a shared cursor.
    RoundRobin(Arc<AtomicUsize>),
    /// Always the first endpoint of the tier.
    First,
}

impl Selection {
    /// Round-robin starting at the first endpoint.
    pub fn round_robin() -> Self {
        Selection::RoundRobin(Arc::new(AtomicUsize::new(0)))
    }

    /// Index into a tier of `len` endpoints. `len` must be non-zero.
    pub(crate) fn pick(&self, len: usize, rand: &dyn Rand) -> usize {
        match self {
            Selection::Random => rand.int(len),
            Selection::RoundRobin(cursor) => cursor.fetch_add(1, Ordering::Relaxed) % len,
            Selection::First => 0,
        }
    }
}
