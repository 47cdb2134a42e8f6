//! Injectable random source
//!
//! Every random draw in the simulation (payload sizes, id salts, failure
//! rolls) goes through [`RandomSource`] so tests can replay exact sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform draws in `[0, 1)`
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[low, high)`
    fn next_range(&mut self, low: u32, high: u32) -> u32 {
        debug_assert!(low < high);
        let span = (high - low) as f64;
        low + ((self.next_f64() * span).floor() as u32).min(high - low - 1)
    }
}

/// `rand`-backed source
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Values are clamped into `[0, 1)`; an empty sequence always yields 0
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Always yields `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }
}
