//! Differentially private count.

use rand::RngCore;

use super::error::{AlgorithmError, Result};
use super::laplace::LaplaceMechanism;
use super::Algorithm;

/// Noisy record count, rounded to the nearest integer
#[derive(Debug, Clone)]
pub struct Count {
    mechanism: LaplaceMechanism,
    count: u64,
}

impl Count {
    /// Create a count with the given privacy budget
    pub fn new(epsilon: f64) -> Result<Self> {
        Ok(Self { mechanism: LaplaceMechanism::new(epsilon, 1.0)?, count: 0 })
    }

    /// Scale the Laplace noise down by `ratio`
    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.mechanism = self.mechanism.with_noise_ratio(ratio)?;
        Ok(self)
    }
}

impl Algorithm for Count {
    fn name(&self) -> &'static str {
        "Count"
    }

    fn epsilon(&self) -> f64 {
        self.mechanism.epsilon()
    }

    fn add_record(&mut self, _record: f64) {
        self.count += 1;
    }

    fn result(&mut self, rng: &mut dyn RngCore) -> Result<f64> {
        let noisy = self.mechanism.add_noise(self.count as f64, rng).round();
        if noisy.is_finite() {
            Ok(noisy)
        } else {
            Err(AlgorithmError::NonFiniteOutput { algorithm: self.name(), value: noisy })
        }
    }
}
