//! Empirical output histograms.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use dp_stochastic_common::{Result, StochasticError};

use super::dataset::Dataset;
use super::family::FamilyUnderTest;

/// Discretisation of algorithm outputs into bucket keys
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Binning {
    /// One bucket per integer, outputs rounded to the nearest
    Exact,
    /// Fixed-width buckets `[k * width, (k + 1) * width)`
    Width { width: f64 },
}

impl Binning {
    /// Fixed-width binning; `width` must be finite and positive
    pub fn width(width: f64) -> Result<Self> {
        if width.is_finite() && width > 0.0 {
            Ok(Self::Width { width })
        } else {
            Err(StochasticError::config(
                "bucket_width",
                format!("must be finite and positive, got {width}"),
            ))
        }
    }

    /// Bucket key for an output; out-of-range values saturate into the
    /// extreme keys rather than being dropped
    pub fn bucket(&self, value: f64) -> i64 {
        match self {
            Self::Exact => value.round() as i64,
            Self::Width { width } => (value / width).floor() as i64,
        }
    }
}

/// Bucket counts from repeated runs on one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    buckets: BTreeMap<i64, u64>,
    total: u64,
}

impl Histogram {
    fn record(&mut self, key: i64) {
        *self.buckets.entry(key).or_insert(0) += 1;
        self.total += 1;
    }

    /// Count observed in `key`
    pub fn get(&self, key: i64) -> u64 {
        self.buckets.get(&key).copied().unwrap_or(0)
    }

    /// Estimated probability of `key`
    pub fn probability(&self, key: i64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.get(key) as f64 / self.total as f64
        }
    }

    /// Sum of all bucket counts
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of non-empty buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Non-empty buckets in key order
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.buckets.iter().map(|(k, c)| (*k, *c))
    }
}

impl FromIterator<(i64, u64)> for Histogram {
    fn from_iter<I: IntoIterator<Item = (i64, u64)>>(iter: I) -> Self {
        let mut histogram = Self::default();
        for (key, count) in iter.into_iter().filter(|(_, c)| *c > 0) {
            *histogram.buckets.entry(key).or_insert(0) += count;
            histogram.total += count;
        }
        histogram
    }
}

/// Run the family's algorithm `num_samples` times on `dataset` and bucket
/// every output
pub fn sample(
    family: &dyn FamilyUnderTest,
    dataset: &Dataset,
    num_samples: usize,
    rng: &mut dyn RngCore,
) -> Result<Histogram> {
    let binning = family.binning();
    let mut histogram = Histogram::default();
    for _ in 0..num_samples {
        let output = family.sample_once(dataset, rng)?;
        histogram.record(binning.bucket(output));
    }
    Ok(histogram)
}
