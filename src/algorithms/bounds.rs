//! Clamping bounds for bounded aggregations.

use serde::{Deserialize, Serialize};

use super::error::{AlgorithmError, Result};

/// Closed interval every record is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// Create bounds, rejecting empty or non-finite intervals
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check that `lower < upper` and both are finite
    pub fn validate(&self) -> Result<()> {
        if !(self.lower.is_finite() && self.upper.is_finite()) {
            return Err(AlgorithmError::InvalidParameter(format!(
                "bounds must be finite, got [{}, {}]",
                self.lower, self.upper
            )));
        }
        if self.lower >= self.upper {
            return Err(AlgorithmError::InvalidParameter(format!(
                "lower bound {} must be below upper bound {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    /// Clamp a record into the interval
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    /// Centre of the interval
    pub fn midpoint(&self) -> f64 {
        f64::midpoint(self.lower, self.upper)
    }

    /// Width of the interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Largest absolute contribution a single record can make to a sum
    pub fn max_magnitude(&self) -> f64 {
        self.lower.abs().max(self.upper.abs())
    }
}
