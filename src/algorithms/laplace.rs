//! Laplace mechanism.
//!
//! Adds noise drawn from `Lap(0, b)` with `b = sensitivity / epsilon`, which
//! gives pure epsilon-DP for a query with the given L1 sensitivity. Sampling
//! uses the inverse CDF:
//!
//! ```text
//! X = -b * sign(U) * ln(1 - 2|U|),  U ~ Uniform(-0.5, 0.5)
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{AlgorithmError, Result};

/// Calibrated Laplace noise source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaplaceMechanism {
    epsilon: f64,
    sensitivity: f64,
    noise_ratio: f64,
}

impl LaplaceMechanism {
    /// Create a mechanism for the given budget and L1 sensitivity
    pub fn new(epsilon: f64, sensitivity: f64) -> Result<Self> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(AlgorithmError::InvalidParameter(format!(
                "epsilon must be finite and positive, got {epsilon}"
            )));
        }
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            return Err(AlgorithmError::InvalidParameter(format!(
                "sensitivity must be finite and positive, got {sensitivity}"
            )));
        }
        Ok(Self { epsilon, sensitivity, noise_ratio: 1.0 })
    }

    /// Scale the noise down by `ratio` in (0, 1]
    ///
    /// A ratio below one yields a mechanism that no longer meets its budget.
    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(AlgorithmError::InvalidParameter(format!(
                "noise_ratio must lie in (0, 1], got {ratio}"
            )));
        }
        self.noise_ratio = ratio;
        Ok(self)
    }

    /// Privacy parameter
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Laplace scale `b` actually applied
    pub fn scale(&self) -> f64 {
        self.sensitivity / self.epsilon * self.noise_ratio
    }

    /// Draw one noise value
    pub fn sample_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u = rng.random::<f64>() - 0.5;
        let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
        -self.scale() * u.signum() * tail.ln()
    }

    /// Return `value` plus one noise draw
    pub fn add_noise<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        value + self.sample_noise(rng)
    }
}
