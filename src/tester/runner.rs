//! Stochastic tester: drives generation, sampling and evaluation for one
//! family and streams a row per case.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use dp_stochastic_common::{Result, StochasticError};

use super::cancel::CancellationToken;
use super::family::FamilyUnderTest;
use super::histogram::sample;
use super::ratio::{evaluate, RatioEvaluation};
use super::result::{Measurement, RatioResult, SummaryResults};
use super::sequence::TestCase;
use super::sink::ResultSink;

/// Which dataset of a pair a noise stream belongs to
#[derive(Debug, Clone, Copy)]
enum Side {
    Base = 0,
    Neighbor = 1,
}

/// Check the acceptance corridor: both ends in the open interval (0, 1)
/// and `ratio_min <= ratio_max`
pub fn validate_corridor(ratio_min: f64, ratio_max: f64) -> Result<()> {
    for (field, value) in [("ratio_min", ratio_min), ("ratio_max", ratio_max)] {
        if !(value > 0.0 && value < 1.0) {
            return Err(StochasticError::config(
                field,
                format!("must lie in the open interval (0, 1), got {value}"),
            ));
        }
    }
    if ratio_min > ratio_max {
        return Err(StochasticError::config(
            "ratio_min",
            format!("{ratio_min} exceeds ratio_max {ratio_max}"),
        ));
    }
    Ok(())
}

/// Parameters of one family run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunConfig {
    pub num_datasets: usize,
    pub num_samples_per_histogram: usize,
    pub ratio_min: f64,
    pub ratio_max: f64,
    /// Fixes every noise stream when set
    pub seed: Option<u64>,
    /// Evaluate cases on the rayon pool
    pub parallel: bool,
}

impl TestRunConfig {
    pub fn new(num_datasets: usize, num_samples_per_histogram: usize, ratio_min: f64, ratio_max: f64) -> Self {
        Self { num_datasets, num_samples_per_histogram, ratio_min, ratio_max, seed: None, parallel: false }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_datasets == 0 {
            return Err(StochasticError::config("num_datasets", "must be greater than 0"));
        }
        if self.num_samples_per_histogram == 0 {
            return Err(StochasticError::config(
                "num_samples_per_histogram",
                "must be greater than 0",
            ));
        }
        validate_corridor(self.ratio_min, self.ratio_max)
    }
}

/// Orchestrates one family run
#[derive(Debug, Clone)]
pub struct StochasticTester {
    config: TestRunConfig,
    cancel: CancellationToken,
}

impl StochasticTester {
    pub fn new(config: TestRunConfig) -> Self {
        Self { config, cancel: CancellationToken::new() }
    }

    /// Stop between cases once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &TestRunConfig {
        &self.config
    }

    /// Run every case of `family`, writing the header and one row per case
    ///
    /// Setup problems fail before anything is written. Invocation errors
    /// become failed rows; any other error from the family, a sink error or
    /// cancellation ends the run after the rows already written.
    pub fn run_tests<W: Write>(
        &self,
        family: &dyn FamilyUnderTest,
        sink: &mut ResultSink<W>,
    ) -> Result<SummaryResults> {
        self.config.validate()?;
        let cases = family.generate_sequence(self.config.num_datasets)?;

        let span = info_span!("run_tests", family = %family.family(), algorithm = %family.algorithm_name());
        let _guard = span.enter();
        info!(
            cases = cases.len(),
            samples = self.config.num_samples_per_histogram,
            parallel = self.config.parallel,
            "starting stochastic test run"
        );

        sink.write_header()?;
        let summary = if self.config.parallel {
            self.run_parallel(family, &cases, sink)?
        } else {
            self.run_sequential(family, &cases, sink)?
        };
        sink.flush()?;

        info!(passed = summary.passed, failed = summary.failed, errored = summary.errored, "run finished");
        Ok(summary)
    }

    fn run_sequential<W: Write>(
        &self,
        family: &dyn FamilyUnderTest,
        cases: &[TestCase],
        sink: &mut ResultSink<W>,
    ) -> Result<SummaryResults> {
        let mut summary = SummaryResults::new(family.family());
        for (index, case) in cases.iter().enumerate() {
            self.check_cancelled(index)?;
            let result = self.evaluate_case(family, index, case, cases.len())?;
            sink.write_row(&result)?;
            summary = summary.absorb(&result);
        }
        Ok(summary)
    }

    /// Cases are evaluated a chunk at a time on the rayon pool; rows of a
    /// chunk are written in generation order before the next chunk starts
    fn run_parallel<W: Write>(
        &self,
        family: &dyn FamilyUnderTest,
        cases: &[TestCase],
        sink: &mut ResultSink<W>,
    ) -> Result<SummaryResults> {
        let chunk_size = rayon::current_num_threads().max(1);
        let indexed: Vec<(usize, &TestCase)> = cases.iter().enumerate().collect();
        let mut summary = SummaryResults::new(family.family());

        for chunk in indexed.chunks(chunk_size) {
            self.check_cancelled(chunk[0].0)?;
            let results: Vec<Result<RatioResult>> = chunk
                .par_iter()
                .map(|(index, case)| self.evaluate_case(family, *index, case, cases.len()))
                .collect();
            let chunk_summary = results.into_iter().try_fold(
                SummaryResults::new(family.family()),
                |acc, result| -> Result<SummaryResults> {
                    let result = result?;
                    sink.write_row(&result)?;
                    Ok(acc.absorb(&result))
                },
            )?;
            summary = summary.merge(chunk_summary);
        }
        Ok(summary)
    }

    fn check_cancelled(&self, completed: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(completed, "run cancelled");
            return Err(StochasticError::Cancelled { completed });
        }
        Ok(())
    }

    /// Sample both datasets of `case` and judge the ratio
    ///
    /// Invocation errors are folded into a failed result; only fatal errors
    /// are returned.
    pub fn evaluate_case(
        &self,
        family: &dyn FamilyUnderTest,
        index: usize,
        case: &TestCase,
        num_datasets: usize,
    ) -> Result<RatioResult> {
        let start = Instant::now();
        let outcome = self.compare_pair(family, index, case);
        let elapsed_seconds = start.elapsed().as_secs_f64();

        let (actual_ratio, passed) = match outcome {
            Ok(evaluation) => {
                debug!(
                    case = %case.name,
                    ratio = ?evaluation.actual_ratio,
                    compared = evaluation.compared_buckets,
                    unmatched_mass = evaluation.unmatched_mass,
                    "case evaluated"
                );
                let measurement = evaluation.actual_ratio.map_or(Measurement::NoOverlap, Measurement::Ratio);
                (measurement, evaluation.passed)
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(case = %case.name, error = %err, "algorithm failed during sampling");
                (Measurement::Error(err.to_string()), false)
            }
        };

        Ok(RatioResult {
            test_name: case.name.clone(),
            algorithm: family.algorithm_name(),
            expected_ratio: case.expected_ratio_bound,
            actual_ratio,
            passed,
            num_datasets,
            num_samples: self.config.num_samples_per_histogram,
            elapsed_seconds,
        })
    }

    fn compare_pair(
        &self,
        family: &dyn FamilyUnderTest,
        index: usize,
        case: &TestCase,
    ) -> Result<RatioEvaluation> {
        let samples = self.config.num_samples_per_histogram;
        let pair = &case.neighbor_pair;

        let mut rng = self.noise_rng(index, Side::Base);
        let base = sample(family, pair.base(), samples, &mut rng)?;
        let mut rng = self.noise_rng(index, Side::Neighbor);
        let neighbor = sample(family, pair.neighbor(), samples, &mut rng)?;

        Ok(evaluate(&base, &neighbor, self.config.ratio_min, self.config.ratio_max))
    }

    /// One ChaCha stream per case and side under the run seed
    fn noise_rng(&self, index: usize, side: Side) -> ChaCha8Rng {
        let seed = self.config.seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream((index as u64) << 1 | side as u64);
        rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults_are_valid() {
        assert!(TestRunConfig::new(10, 100, 0.90, 0.91).validate().is_ok());
    }

    #[test]
    fn test_corridor_is_open_interval() {
        for (min, max) in [(0.0, 0.5), (0.5, 1.0), (-0.1, 0.5), (0.5, 1.5), (f64::NAN, 0.5)] {
            let err = TestRunConfig::new(10, 100, min, max).validate().unwrap_err();
            assert!(matches!(err, StochasticError::Configuration { .. }), "({min}, {max})");
        }
    }

    #[test]
    fn test_corridor_must_be_ordered() {
        let err = validate_corridor(0.95, 0.9).unwrap_err();
        assert!(err.to_string().contains("ratio_min"));
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(TestRunConfig::new(0, 100, 0.9, 0.91).validate().is_err());
        assert!(TestRunConfig::new(10, 0, 0.9, 0.91).validate().is_err());
    }

    #[test]
    fn test_seeded_streams_differ_per_case_and_side() {
        use rand::RngCore;
        let tester = StochasticTester::new(TestRunConfig::new(1, 1, 0.5, 0.6).with_seed(9));
        let a = tester.noise_rng(0, Side::Base).next_u64();
        let b = tester.noise_rng(0, Side::Neighbor).next_u64();
        let c = tester.noise_rng(1, Side::Base).next_u64();
        let again = tester.noise_rng(0, Side::Base).next_u64();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, again);
    }

    #[test]
    fn test_seeded_stream_is_chacha8() {
        use rand::RngCore;
        let tester = StochasticTester::new(TestRunConfig::new(1, 1, 0.5, 0.6).with_seed(9));
        let mut expected = ChaCha8Rng::seed_from_u64(9);
        expected.set_stream(5 << 1 | 1);
        assert_eq!(tester.noise_rng(5, Side::Neighbor).next_u64(), expected.next_u64());
    }

    #[test]
    fn test_unseeded_streams_are_independent() {
        use rand::RngCore;
        let tester = StochasticTester::new(TestRunConfig::new(1, 1, 0.5, 0.6));
        assert_ne!(tester.noise_rng(0, Side::Base).next_u64(), tester.noise_rng(0, Side::Base).next_u64());
    }
}
