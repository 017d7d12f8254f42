//! # dp-stochastic
//!
//! Statistical acceptance harness for differentially-private aggregations.
//!
//! The [`tester`] feeds neighbouring datasets to the noisy [`algorithms`]
//! many times, compares the output distributions bucket by bucket and
//! records whether the worst probability ratio stays inside an acceptance
//! corridor. Results are streamed as one CSV-style line per test case.
//!
//! ## Modules
//!
//! - [`algorithms`]: Laplace count, bounded sum and bounded mean
//! - [`tester`]: sequence generation, histogram sampling, ratio evaluation
//!   and the run orchestrator
//! - [`config`]: YAML configuration and CLI arguments
//! - [`cli`]: command handlers behind the `dp-stochastic` binary

pub mod algorithms;
pub mod cli;
pub mod config;
pub mod tester;

pub use dp_stochastic_common::{OutputFormat, Result, StochasticError};
pub use config::TesterConfig;
pub use tester::{
    AlgorithmFamily, CancellationToken, FamilyUnderTest, RatioResult, ResultSink, StochasticTester,
    SummaryResults, TestRunConfig,
};
