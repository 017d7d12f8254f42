//! Harness configuration: defaults, YAML loading and validation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use dp_stochastic_common::{Result, StochasticError};

use crate::algorithms::{Bounds, DEFAULT_EPSILON};
use crate::tester::{
    validate_corridor, AlgorithmFamily, CountFamily, FamilyUnderTest, MeanFamily, SequenceGenerator,
    SumFamily, TestRunConfig,
};

/// Default directory result files are written to
pub const DEFAULT_OUTPUT_DIR: &str = "testing/evaluation/results/";

/// Per-family overrides; unset fields fall back to the reference setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilySettings {
    /// Length of the generated sequence; defaults to the curated table size
    pub num_datasets: Option<usize>,
    /// Result file; a bare file name lands in `output_dir`
    pub results_file: Option<PathBuf>,
    /// Histogram bucket width for continuous outputs
    pub bucket_width: Option<f64>,
    /// Clamp interval for bounded families
    pub bounds: Option<Bounds>,
}

/// Complete configuration of a harness invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesterConfig {
    pub num_samples_per_histogram: usize,
    pub ratio_min: f64,
    pub ratio_max: f64,
    pub epsilon: f64,
    /// Scales the noise of every algorithm; `1.0` is the calibrated setting
    pub noise_ratio: f64,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub output_dir: PathBuf,
    /// Families to run, in order
    pub families: Vec<AlgorithmFamily>,
    pub count: FamilySettings,
    pub sum: FamilySettings,
    pub mean: FamilySettings,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            num_samples_per_histogram: 100,
            ratio_min: 0.90,
            ratio_max: 0.91,
            epsilon: DEFAULT_EPSILON,
            noise_ratio: 1.0,
            seed: None,
            parallel: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            families: AlgorithmFamily::ALL.to_vec(),
            count: FamilySettings::default(),
            sum: FamilySettings::default(),
            mean: FamilySettings::default(),
        }
    }
}

impl TesterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.num_samples_per_histogram = samples;
        self
    }

    pub fn with_corridor(mut self, ratio_min: f64, ratio_max: f64) -> Self {
        self.ratio_min = ratio_min;
        self.ratio_max = ratio_max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_noise_ratio(mut self, ratio: f64) -> Self {
        self.noise_ratio = ratio;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_families(mut self, families: Vec<AlgorithmFamily>) -> Self {
        self.families = families;
        self
    }

    pub fn settings(&self, family: AlgorithmFamily) -> &FamilySettings {
        match family {
            AlgorithmFamily::Count => &self.count,
            AlgorithmFamily::Sum => &self.sum,
            AlgorithmFamily::Mean => &self.mean,
        }
    }

    pub fn settings_mut(&mut self, family: AlgorithmFamily) -> &mut FamilySettings {
        match family {
            AlgorithmFamily::Count => &mut self.count,
            AlgorithmFamily::Sum => &mut self.sum,
            AlgorithmFamily::Mean => &mut self.mean,
        }
    }

    pub fn num_datasets(&self, family: AlgorithmFamily) -> usize {
        self.settings(family).num_datasets.unwrap_or_else(|| family.reference_case_count())
    }

    /// Where `family`'s rows are written
    ///
    /// A bare file name is placed in `output_dir`; a path with a directory
    /// component is used as given.
    pub fn results_path(&self, family: AlgorithmFamily) -> PathBuf {
        match &self.settings(family).results_file {
            Some(file) if file.is_absolute() || has_directory(file) => file.clone(),
            Some(file) => self.output_dir.join(file),
            None => self.output_dir.join(family.default_results_file()),
        }
    }

    /// Check every field against its domain
    pub fn validate(&self) -> Result<()> {
        validate_corridor(self.ratio_min, self.ratio_max)?;
        if self.num_samples_per_histogram == 0 {
            return Err(StochasticError::config(
                "num_samples_per_histogram",
                "must be greater than 0",
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(StochasticError::config(
                "epsilon",
                format!("must be positive and finite, got {}", self.epsilon),
            ));
        }
        if !(self.noise_ratio > 0.0 && self.noise_ratio <= 1.0) {
            return Err(StochasticError::config(
                "noise_ratio",
                format!("must lie in (0, 1], got {}", self.noise_ratio),
            ));
        }
        if self.families.is_empty() {
            return Err(StochasticError::config("families", "at least one family is required"));
        }

        // each sink belongs to exactly one family run
        let mut claimed: Vec<(AlgorithmFamily, PathBuf)> = Vec::with_capacity(self.families.len());
        for &family in &self.families {
            let path = self.results_path(family);
            if let Some((owner, _)) = claimed.iter().find(|(_, p)| *p == path) {
                return Err(StochasticError::config(
                    "files",
                    format!("{family} and {owner} would both write {}", path.display()),
                ));
            }
            claimed.push((family, path));
        }

        for family in AlgorithmFamily::ALL {
            let settings = self.settings(family);
            if settings.num_datasets == Some(0) {
                return Err(StochasticError::config(
                    format!("{family}.num_datasets"),
                    "must be greater than 0",
                ));
            }
            if let Some(width) = settings.bucket_width {
                if !(width.is_finite() && width > 0.0) {
                    return Err(StochasticError::config(
                        format!("{family}.bucket_width"),
                        format!("must be positive and finite, got {width}"),
                    ));
                }
            }
            if let Some(bounds) = settings.bounds {
                bounds
                    .validate()
                    .map_err(|e| StochasticError::config(format!("{family}.bounds"), e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Run parameters for one family
    pub fn run_config(&self, family: AlgorithmFamily) -> TestRunConfig {
        TestRunConfig {
            num_datasets: self.num_datasets(family),
            num_samples_per_histogram: self.num_samples_per_histogram,
            ratio_min: self.ratio_min,
            ratio_max: self.ratio_max,
            seed: self.seed,
            parallel: self.parallel,
        }
    }

    /// Build the configured implementation of `family`
    pub fn family_under_test(&self, family: AlgorithmFamily) -> Result<Box<dyn FamilyUnderTest>> {
        let settings = self.settings(family);
        Ok(match family {
            AlgorithmFamily::Count => {
                Box::new(CountFamily::new(self.epsilon)?.with_noise_ratio(self.noise_ratio)?)
            }
            AlgorithmFamily::Sum => {
                let bounds = settings.bounds.unwrap_or(SequenceGenerator::REFERENCE_SUM_BOUNDS);
                let mut sum = SumFamily::new(self.epsilon, bounds)?.with_noise_ratio(self.noise_ratio)?;
                if let Some(width) = settings.bucket_width {
                    sum = sum.with_bucket_width(width)?;
                }
                Box::new(sum)
            }
            AlgorithmFamily::Mean => {
                let bounds = settings.bounds.unwrap_or(SequenceGenerator::REFERENCE_MEAN_BOUNDS);
                let mut mean = MeanFamily::new(self.epsilon, bounds)?.with_noise_ratio(self.noise_ratio)?;
                if let Some(width) = settings.bucket_width {
                    mean = mean.with_bucket_width(width)?;
                }
                Box::new(mean)
            }
        })
    }
}

fn has_directory(path: &Path) -> bool {
    path.parent().is_some_and(|parent| !parent.as_os_str().is_empty())
}

/// Load a YAML configuration file; missing keys take their defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TesterConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| StochasticError::io(format!("reading config {}", path.display()), e))?;
    serde_yaml::from_str(&content).map_err(|e| StochasticError::ConfigParsing {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
