//! Stochastic differential-privacy tester.
//!
//! For each algorithm family a deterministic sequence of neighbouring
//! dataset pairs is generated. Both datasets of a pair are fed to the
//! algorithm many times, the outputs are bucketed into histograms and the
//! worst bucket-wise probability ratio is checked against an acceptance
//! corridor. One result row is streamed per pair.
//!
//! # Example
//!
//! ```no_run
//! use dp_stochastic::tester::{CountFamily, ResultSink, StochasticTester, TestRunConfig};
//! use dp_stochastic::algorithms::DEFAULT_EPSILON;
//!
//! let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
//! let tester = StochasticTester::new(TestRunConfig::new(10, 100, 0.90, 0.91));
//! let mut sink = ResultSink::new(std::io::stdout());
//! let summary = tester.run_tests(&family, &mut sink).unwrap();
//! println!("{summary}");
//! ```

mod cancel;
mod dataset;
mod family;
mod histogram;
mod ratio;
mod result;
mod runner;
mod sequence;
mod sink;

pub use cancel::CancellationToken;
pub use dataset::{structural_distance, Dataset, Edit, NeighborPair};
pub use family::{AlgorithmFamily, CountFamily, FamilyUnderTest, MeanFamily, SumFamily};
pub use histogram::{sample, Binning, Histogram};
pub use ratio::{evaluate, RatioEvaluation};
pub use result::{Measurement, RatioResult, SummaryResults, CSV_HEADER};
pub use runner::{validate_corridor, StochasticTester, TestRunConfig};
pub use sequence::{expected_ratio_bound, radical_inverse, HaltonSequence, SequenceGenerator, TestCase};
pub use sink::ResultSink;
