//! Algorithm families and the capability interface the orchestrator drives.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dp_stochastic_common::{Result, StochasticError};

use super::dataset::{Dataset, Edit};
use super::histogram::Binning;
use super::sequence::{expected_ratio_bound, SequenceGenerator, TestCase};
use crate::algorithms::{Algorithm, AlgorithmError, BoundedMean, BoundedSum, Bounds, Count};

/// Supported aggregation families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmFamily {
    Count,
    Sum,
    Mean,
}

impl AlgorithmFamily {
    /// Every family, in report order
    pub const ALL: [Self; 3] = [Self::Count, Self::Sum, Self::Mean];

    /// Lower-case identifier
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }

    /// Size of the curated case table shared with the statistical tester.
    ///
    /// These counts must not change: the external suite replays the same
    /// sequences.
    pub fn reference_case_count(&self) -> usize {
        match self {
            Self::Count => 10,
            Self::Sum => 17,
            Self::Mean => 22,
        }
    }

    /// Default result file name
    pub fn default_results_file(&self) -> &'static str {
        match self {
            Self::Count => "stochastic_tester_results_counttest.txt",
            Self::Sum => "stochastic_tester_results_sumtest.txt",
            Self::Mean => "stochastic_tester_results_meantest.txt",
        }
    }
}

impl FromStr for AlgorithmFamily {
    type Err = StochasticError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" | "bounded-sum" | "bounded_sum" => Ok(Self::Sum),
            "mean" | "bounded-mean" | "bounded_mean" => Ok(Self::Mean),
            _ => Err(StochasticError::UnsupportedFamily { name: s.to_string() }),
        }
    }
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the orchestrator needs from one algorithm family
pub trait FamilyUnderTest: Send + Sync {
    /// Family this implementation covers
    fn family(&self) -> AlgorithmFamily;

    /// Name written to the `algorithm` column
    fn algorithm_name(&self) -> String;

    /// Privacy budget the algorithm is configured with
    fn epsilon(&self) -> f64;

    /// Output discretisation for histograms
    fn binning(&self) -> Binning;

    /// Deterministic test-case sequence of length `num_datasets`
    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>>;

    /// One independent noisy output on `dataset`
    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64>;

    /// Theoretical ceiling of the output probability ratio for `edit`
    fn expected_ratio_bound(&self, edit: &Edit) -> f64 {
        expected_ratio_bound(self.epsilon(), edit)
    }
}

fn invoke<A: Algorithm>(mut algorithm: A, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
    algorithm.add_records(dataset.records());
    algorithm.result(rng).map_err(|e| invocation_error(algorithm.name(), e))
}

fn invocation_error(algorithm: &str, err: AlgorithmError) -> StochasticError {
    StochasticError::AlgorithmInvocation { algorithm: algorithm.to_string(), message: err.to_string() }
}

fn setup_error(err: AlgorithmError) -> StochasticError {
    StochasticError::config("algorithm", err.to_string())
}

fn display_name(base: &str, noise_ratio: f64) -> String {
    if noise_ratio < 1.0 {
        format!("{base}(noise_ratio={noise_ratio})")
    } else {
        base.to_string()
    }
}

/// Noisy count under test
#[derive(Debug, Clone)]
pub struct CountFamily {
    prototype: Count,
    noise_ratio: f64,
}

impl CountFamily {
    pub fn new(epsilon: f64) -> Result<Self> {
        Ok(Self { prototype: Count::new(epsilon).map_err(setup_error)?, noise_ratio: 1.0 })
    }

    /// Test the insufficient-noise variant scaled by `ratio`
    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.prototype = self.prototype.with_noise_ratio(ratio).map_err(setup_error)?;
        self.noise_ratio = ratio;
        Ok(self)
    }
}

impl FamilyUnderTest for CountFamily {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Count
    }

    fn algorithm_name(&self) -> String {
        display_name(self.prototype.name(), self.noise_ratio)
    }

    fn epsilon(&self) -> f64 {
        self.prototype.epsilon()
    }

    fn binning(&self) -> Binning {
        Binning::Exact
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        SequenceGenerator::new(self.epsilon()).generate(AlgorithmFamily::Count, num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        invoke(self.prototype.clone(), dataset, rng)
    }
}

/// Bounded sum under test
#[derive(Debug, Clone)]
pub struct SumFamily {
    prototype: BoundedSum,
    noise_ratio: f64,
    binning: Binning,
}

impl SumFamily {
    /// Reference bucket width for sum outputs
    pub const DEFAULT_BUCKET_WIDTH: f64 = 2.0;

    pub fn new(epsilon: f64, bounds: Bounds) -> Result<Self> {
        Ok(Self {
            prototype: BoundedSum::new(epsilon, bounds).map_err(setup_error)?,
            noise_ratio: 1.0,
            binning: Binning::Width { width: Self::DEFAULT_BUCKET_WIDTH },
        })
    }

    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.prototype = self.prototype.with_noise_ratio(ratio).map_err(setup_error)?;
        self.noise_ratio = ratio;
        Ok(self)
    }

    pub fn with_bucket_width(mut self, width: f64) -> Result<Self> {
        self.binning = Binning::width(width)?;
        Ok(self)
    }
}

impl FamilyUnderTest for SumFamily {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Sum
    }

    fn algorithm_name(&self) -> String {
        display_name(self.prototype.name(), self.noise_ratio)
    }

    fn epsilon(&self) -> f64 {
        self.prototype.epsilon()
    }

    fn binning(&self) -> Binning {
        self.binning
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        SequenceGenerator::new(self.epsilon())
            .with_sum_bounds(self.prototype.bounds())
            .generate(AlgorithmFamily::Sum, num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        invoke(self.prototype.clone(), dataset, rng)
    }
}

/// Bounded mean under test
#[derive(Debug, Clone)]
pub struct MeanFamily {
    prototype: BoundedMean,
    noise_ratio: f64,
    binning: Binning,
}

impl MeanFamily {
    /// Reference bucket width for mean outputs
    pub const DEFAULT_BUCKET_WIDTH: f64 = 0.25;

    pub fn new(epsilon: f64, bounds: Bounds) -> Result<Self> {
        Ok(Self {
            prototype: BoundedMean::new(epsilon, bounds).map_err(setup_error)?,
            noise_ratio: 1.0,
            binning: Binning::Width { width: Self::DEFAULT_BUCKET_WIDTH },
        })
    }

    pub fn with_noise_ratio(mut self, ratio: f64) -> Result<Self> {
        self.prototype = self.prototype.with_noise_ratio(ratio).map_err(setup_error)?;
        self.noise_ratio = ratio;
        Ok(self)
    }

    pub fn with_bucket_width(mut self, width: f64) -> Result<Self> {
        self.binning = Binning::width(width)?;
        Ok(self)
    }
}

impl FamilyUnderTest for MeanFamily {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Mean
    }

    fn algorithm_name(&self) -> String {
        display_name(self.prototype.name(), self.noise_ratio)
    }

    fn epsilon(&self) -> f64 {
        self.prototype.epsilon()
    }

    fn binning(&self) -> Binning {
        self.binning
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        SequenceGenerator::new(self.epsilon())
            .with_mean_bounds(self.prototype.bounds())
            .generate(AlgorithmFamily::Mean, num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        invoke(self.prototype.clone(), dataset, rng)
    }
}
