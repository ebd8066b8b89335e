//! Shadow sampling gate.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides per request whether a shadow copy is sent.
///
/// One generator is seeded at startup and shared by all requests; each
/// draw takes the lock only for the duration of the draw itself.
#[derive(Debug)]
pub struct Sampler {
    percent: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Create a sampler seeded from OS entropy.
    pub fn new(percent: f64) -> Self {
        Self::from_rng(percent, StdRng::from_entropy())
    }

    /// Create a sampler with a fixed seed, for reproducible draws.
    pub fn with_seed(percent: f64, seed: u64) -> Self {
        Self::from_rng(percent, StdRng::seed_from_u64(seed))
    }

    fn from_rng(percent: f64, rng: StdRng) -> Self {
        Self {
            percent,
            rng: Mutex::new(rng),
        }
    }

    /// Draw once. At 100 percent no draw happens and the answer is always yes.
    pub fn should_shadow(&self) -> bool {
        if self.percent >= 100.0 {
            return true;
        }

        let draw = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen::<f64>() * 100.0
        };
        draw < self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn always_at_hundred() {
        let sampler = Sampler::with_seed(100.0, 1);
        assert!((0..10_000).all(|_| sampler.should_shadow()));
    }

    #[test]
    fn never_at_zero() {
        let sampler = Sampler::with_seed(0.0, 1);
        assert!((0..10_000).all(|_| !sampler.should_shadow()));
    }

    #[test]
    fn frequency_converges() {
        let sampler = Sampler::with_seed(25.0, 42);
        let n = 200_000;
        let hits = (0..n).filter(|_| sampler.should_shadow()).count();
        let ratio = hits as f64 / n as f64;
        assert!((ratio - 0.25).abs() < 0.01, "ratio was {ratio}");
    }

    #[test]
    fn concurrent_draws_are_safe() {
        let sampler = Arc::new(Sampler::with_seed(50.0, 7));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sampler = Arc::clone(&sampler);
                std::thread::spawn(move || (0..10_000).filter(|_| sampler.should_shadow()).count())
            })
            .collect();

        let hits: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let ratio = hits as f64 / 80_000.0;
        assert!((ratio - 0.5).abs() < 0.02, "ratio was {ratio}");
    }
}
