//! Differentially private bounded mean.
//!
//! Records are clamped and shifted by the interval midpoint. Half the budget
//! goes to a noisy normalised sum (sensitivity `width / 2`), half to a noisy
//! count (sensitivity 1). The estimate is
//! `midpoint + noisy_sum / max(1, noisy_count)`, clamped to the bounds.

use rand::RngCore;

use super::bounds::Bounds;
use super::error::{AlgorithmError, Result};
use super::laplace::LaplaceMechanism;
use super::Algorithm;

/// Noisy mean of clamped records
#[derive(Debug, Clone)]
pub struct BoundedMean {
    epsilon: f64,
    bounds: Bounds,
    sum_mechanism: LaplaceMechanism,
    count_mechanism: LaplaceMechanism,
    normalized_sum: f64,
    count: u64,
}

impl BoundedMean {
    /// Create a bounded mean with the given budget and clamping bounds
    pub fn new(epsilon: f64, bounds: Bounds) -> Result<Self> {
        bounds.validate()?;
        let half = epsilon / 2.0;
        Ok(Self {
            epsilon,
            bounds,
            sum_mechanism: LaplaceMechanism::new(half, bounds.width() / 2.0)?,
            count_mechanism: LaplaceMechanism::new(half, 1.0)?,
            normalized_sum: 0.0,
            count: 0,
        })
    }

    /// Scale both noise components down by `ratio`
    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.sum_mechanism = self.sum_mechanism.with_noise_ratio(ratio)?;
        self.count_mechanism = self.count_mechanism.with_noise_ratio(ratio)?;
        Ok(self)
    }

    /// Clamping bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Algorithm for BoundedMean {
    fn name(&self) -> &'static str {
        "BoundedMean"
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn add_record(&mut self, record: f64) {
        if !record.is_nan() {
            self.normalized_sum += self.bounds.clamp(record) - self.bounds.midpoint();
            self.count += 1;
        }
    }

    fn result(&mut self, rng: &mut dyn RngCore) -> Result<f64> {
        let noisy_sum = self.sum_mechanism.add_noise(self.normalized_sum, rng);
        let noisy_count = self.count_mechanism.add_noise(self.count as f64, rng);
        let mean = self.bounds.midpoint() + noisy_sum / noisy_count.max(1.0);
        if mean.is_finite() {
            Ok(self.bounds.clamp(mean))
        } else {
            Err(AlgorithmError::NonFiniteOutput { algorithm: self.name(), value: mean })
        }
    }
}
