use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Seedable random source shared by concurrent callers.
///
/// Callers [`fork`](SharedRng::fork) an independent generator per operation so
/// the lock is never held across an `.await`. With a fixed seed the sequence
/// of forks, and so every draw, is reproducible.
#[derive(Debug)]
pub struct SharedRng {
    inner: Mutex<StdRng>,
}

impl SharedRng {
    /// Seeded from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// A fresh generator derived from the shared one.
    pub fn fork(&self) -> StdRng {
        let mut parent = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        StdRng::seed_from_u64(parent.gen())
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self::new(None)
    }
}
