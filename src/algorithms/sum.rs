//! Differentially private bounded sum.

use rand::RngCore;

use super::bounds::Bounds;
use super::error::{AlgorithmError, Result};
use super::laplace::LaplaceMechanism;
use super::Algorithm;

/// Sum of clamped records plus Laplace noise
///
/// Sensitivity under add/remove-one is `max(|lower|, |upper|)`.
#[derive(Debug, Clone)]
pub struct BoundedSum {
    mechanism: LaplaceMechanism,
    bounds: Bounds,
    sum: f64,
}

impl BoundedSum {
    /// Create a bounded sum with the given budget and clamping bounds
    pub fn new(epsilon: f64, bounds: Bounds) -> Result<Self> {
        bounds.validate()?;
        if bounds.max_magnitude() == 0.0 {
            return Err(AlgorithmError::InvalidParameter(
                "bounds must not both be zero".to_string(),
            ));
        }
        let mechanism = LaplaceMechanism::new(epsilon, bounds.max_magnitude())?;
        Ok(Self { mechanism, bounds, sum: 0.0 })
    }

    /// Scale the Laplace noise down by `ratio`
    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.mechanism = self.mechanism.with_noise_ratio(ratio)?;
        Ok(self)
    }

    /// Clamping bounds
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Algorithm for BoundedSum {
    fn name(&self) -> &'static str {
        "BoundedSum"
    }

    fn epsilon(&self) -> f64 {
        self.mechanism.epsilon()
    }

    fn add_record(&mut self, record: f64) {
        // NaN records carry no information and are dropped
        if !record.is_nan() {
            self.sum += self.bounds.clamp(record);
        }
    }

    fn result(&mut self, rng: &mut dyn RngCore) -> Result<f64> {
        let noisy = self.mechanism.add_noise(self.sum, rng);
        if noisy.is_finite() {
            Ok(noisy)
        } else {
            Err(AlgorithmError::NonFiniteOutput { algorithm: self.name(), value: noisy })
        }
    }
}
