//! End-to-end tests for the stochastic tester
//!
//! Runs whole families through the orchestrator and inspects the streamed
//! result rows and summaries.

use dp_stochastic::algorithms::{Bounds, DEFAULT_EPSILON};
use dp_stochastic::tester::{
    AlgorithmFamily, Binning, CancellationToken, CountFamily, Dataset, FamilyUnderTest, MeanFamily,
    ResultSink, StochasticTester, SumFamily, TestCase, TestRunConfig, CSV_HEADER,
};
use dp_stochastic::{Result, StochasticError};
use rand::RngCore;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Helpers
// =============================================================================

fn run_to_string(
    family: &dyn FamilyUnderTest,
    config: TestRunConfig,
) -> (Result<dp_stochastic::SummaryResults>, String) {
    let mut sink = ResultSink::new(Vec::new());
    let summary = StochasticTester::new(config).run_tests(family, &mut sink);
    let text = String::from_utf8(sink.into_inner()).expect("rows are utf-8");
    (summary, text)
}

/// Rows without the header and without the trailing elapsed-time column
fn deterministic_rows(text: &str) -> Vec<String> {
    text.lines()
        .skip(1)
        .map(|line| line.rsplit_once(',').map_or(line, |(head, _)| head).to_string())
        .collect()
}

fn column(line: &str, index: usize) -> &str {
    line.split(',').nth(index).expect("column present")
}

/// Count family that refuses to run on empty datasets
struct FailsOnEmpty(CountFamily);

impl FamilyUnderTest for FailsOnEmpty {
    fn family(&self) -> AlgorithmFamily {
        self.0.family()
    }

    fn algorithm_name(&self) -> String {
        "FailsOnEmpty".to_string()
    }

    fn epsilon(&self) -> f64 {
        self.0.epsilon()
    }

    fn binning(&self) -> Binning {
        self.0.binning()
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        self.0.generate_sequence(num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        if dataset.is_empty() {
            return Err(StochasticError::AlgorithmInvocation {
                algorithm: "FailsOnEmpty".into(),
                message: "empty input, cannot proceed".into(),
            });
        }
        self.0.sample_once(dataset, rng)
    }
}

/// Count family that cancels `token` once `limit` samples have been drawn
struct CancelAfter {
    inner: CountFamily,
    token: CancellationToken,
    drawn: AtomicUsize,
    limit: usize,
}

impl CancelAfter {
    fn new(token: CancellationToken, limit: usize) -> Self {
        Self { inner: CountFamily::new(DEFAULT_EPSILON).unwrap(), token, drawn: AtomicUsize::new(0), limit }
    }
}

impl FamilyUnderTest for CancelAfter {
    fn family(&self) -> AlgorithmFamily {
        self.inner.family()
    }

    fn algorithm_name(&self) -> String {
        self.inner.algorithm_name()
    }

    fn epsilon(&self) -> f64 {
        self.inner.epsilon()
    }

    fn binning(&self) -> Binning {
        self.inner.binning()
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        self.inner.generate_sequence(num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        if self.drawn.fetch_add(1, Ordering::SeqCst) + 1 == self.limit {
            self.token.cancel();
        }
        self.inner.sample_once(dataset, rng)
    }
}

/// Count family that loses its storage on the third case
struct LosesStorage(CountFamily);

impl FamilyUnderTest for LosesStorage {
    fn family(&self) -> AlgorithmFamily {
        self.0.family()
    }

    fn algorithm_name(&self) -> String {
        self.0.algorithm_name()
    }

    fn epsilon(&self) -> f64 {
        self.0.epsilon()
    }

    fn binning(&self) -> Binning {
        self.0.binning()
    }

    fn generate_sequence(&self, num_datasets: usize) -> Result<Vec<TestCase>> {
        self.0.generate_sequence(num_datasets)
    }

    fn sample_once(&self, dataset: &Dataset, rng: &mut dyn RngCore) -> Result<f64> {
        // only the neighbour of count_small_add holds six records
        if dataset.len() == 6 {
            return Err(StochasticError::io("reading lookup table", io::Error::other("device gone")));
        }
        self.0.sample_once(dataset, rng)
    }
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Reference runs
// =============================================================================

#[test]
fn test_count_reference_run() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    let (summary, text) = run_to_string(&family, TestRunConfig::new(10, 100, 0.90, 0.91));
    let summary = summary.unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(summary.passed + summary.failed, 10);
    assert_eq!(summary.family, AlgorithmFamily::Count);

    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), 8, "{line}");
        assert_eq!(column(line, 1), "Count");
        assert!(matches!(column(line, 4), "true" | "false"));
        assert_eq!(column(line, 5), "10");
        assert_eq!(column(line, 6), "100");
    }
    let passed_rows = lines[1..].iter().filter(|l| column(l, 4) == "true").count();
    assert_eq!(passed_rows, summary.passed);
}

#[test]
fn test_sum_and_mean_reference_runs() {
    let sum = SumFamily::new(DEFAULT_EPSILON, Bounds::new(-10.0, 10.0).unwrap()).unwrap();
    let (summary, text) = run_to_string(&sum, TestRunConfig::new(17, 50, 0.90, 0.91).with_seed(1));
    assert_eq!(summary.unwrap().total(), 17);
    assert_eq!(text.lines().count(), 18);

    let mean = MeanFamily::new(DEFAULT_EPSILON, Bounds::new(0.0, 10.0).unwrap()).unwrap();
    let (summary, text) = run_to_string(&mean, TestRunConfig::new(22, 50, 0.90, 0.91).with_seed(1));
    assert_eq!(summary.unwrap().total(), 22);
    assert_eq!(text.lines().count(), 23);
}

#[test]
fn test_halton_extension_rows() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    let (summary, text) = run_to_string(&family, TestRunConfig::new(14, 20, 0.90, 0.91).with_seed(5));
    assert_eq!(summary.unwrap().total(), 14);

    let names: Vec<&str> = text.lines().skip(1).map(|l| column(l, 0)).collect();
    assert_eq!(names[0], "count_empty_add");
    assert_eq!(names[10], "count_halton_010");
    assert_eq!(names[13], "count_halton_013");
}

// =============================================================================
// Reproducibility
// =============================================================================

#[test]
fn test_seeded_runs_are_identical() {
    let family = SumFamily::new(DEFAULT_EPSILON, Bounds::new(-10.0, 10.0).unwrap()).unwrap();
    let config = TestRunConfig::new(17, 60, 0.90, 0.91).with_seed(42);

    let (_, first) = run_to_string(&family, config.clone());
    let (_, second) = run_to_string(&family, config);
    assert_eq!(deterministic_rows(&first), deterministic_rows(&second));
}

#[test]
fn test_parallel_matches_sequential() {
    let family = MeanFamily::new(DEFAULT_EPSILON, Bounds::new(0.0, 10.0).unwrap()).unwrap();
    let config = TestRunConfig::new(30, 40, 0.90, 0.91).with_seed(7);

    let (seq_summary, sequential) = run_to_string(&family, config.clone());
    let (par_summary, parallel) = run_to_string(&family, config.with_parallel(true));
    assert_eq!(deterministic_rows(&sequential), deterministic_rows(&parallel));
    assert_eq!(seq_summary.unwrap(), par_summary.unwrap());
}

#[test]
fn test_different_seeds_differ() {
    let family = SumFamily::new(DEFAULT_EPSILON, Bounds::new(-10.0, 10.0).unwrap()).unwrap();
    let (_, a) = run_to_string(&family, TestRunConfig::new(17, 100, 0.90, 0.91).with_seed(1));
    let (_, b) = run_to_string(&family, TestRunConfig::new(17, 100, 0.90, 0.91).with_seed(2));
    assert_ne!(deterministic_rows(&a), deterministic_rows(&b));
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn test_corridor_boundaries_rejected_before_writing() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    for (min, max) in [(0.0, 0.91), (0.90, 1.0)] {
        let (summary, text) = run_to_string(&family, TestRunConfig::new(10, 100, min, max));
        assert!(matches!(summary.unwrap_err(), StochasticError::Configuration { .. }));
        assert!(text.is_empty(), "nothing may be written on invalid configuration");
    }
}

#[test]
fn test_zero_samples_rejected() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    let (summary, text) = run_to_string(&family, TestRunConfig::new(10, 0, 0.90, 0.91));
    let err = summary.unwrap_err();
    assert_eq!(err.code(), "E002");
    assert!(text.is_empty());
}

// =============================================================================
// Failure handling
// =============================================================================

#[test]
fn test_invocation_error_becomes_failed_row() {
    let family = FailsOnEmpty(CountFamily::new(DEFAULT_EPSILON).unwrap());
    let (summary, text) = run_to_string(&family, TestRunConfig::new(10, 30, 0.90, 0.91).with_seed(3));
    let summary = summary.unwrap();

    // count_empty_add has an empty base, count_single_remove an empty neighbour
    assert_eq!(summary.total(), 10);
    assert_eq!(summary.errored, 2);
    let first = text.lines().nth(1).unwrap();
    assert_eq!(column(first, 0), "count_empty_add");
    assert!(column(first, 3).starts_with("error: "));
    assert!(first.contains("empty input  cannot proceed"));
    assert_eq!(column(first, 4), "false");
    assert_eq!(first.split(',').count(), 8);
}

#[test]
fn test_sink_failure_surfaces() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    let mut sink = ResultSink::new(ClosedPipe);
    let err = StochasticTester::new(TestRunConfig::new(10, 10, 0.90, 0.91))
        .run_tests(&family, &mut sink)
        .unwrap_err();
    assert!(matches!(err, StochasticError::SinkWrite { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_cancelled_run_stops_before_first_case() {
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let mut sink = ResultSink::new(Vec::new());
    let err = StochasticTester::new(TestRunConfig::new(10, 10, 0.90, 0.91))
        .with_cancellation(token)
        .run_tests(&family, &mut sink)
        .unwrap_err();
    assert!(matches!(err, StochasticError::Cancelled { completed: 0 }));
    assert_eq!(sink.rows_written(), 0);
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec![CSV_HEADER]);
}

#[test]
fn test_cancel_mid_run_keeps_completed_rows() {
    let token = CancellationToken::new();
    // two histograms of 10 samples per case; the limit falls in the third case
    let family = CancelAfter::new(token.clone(), 2 * 10 * 3);

    let mut sink = ResultSink::new(Vec::new());
    let err = StochasticTester::new(TestRunConfig::new(10, 10, 0.90, 0.91).with_seed(4))
        .with_cancellation(token)
        .run_tests(&family, &mut sink)
        .unwrap_err();
    assert!(matches!(err, StochasticError::Cancelled { completed: 3 }));
    assert_eq!(sink.rows_written(), 3);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let names: Vec<&str> = text.lines().skip(1).map(|l| column(l, 0)).collect();
    assert_eq!(names, vec!["count_empty_add", "count_single_remove", "count_small_add"]);
}

#[test]
fn test_cancel_mid_parallel_run_stops_at_chunk_boundary() {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
    let token = CancellationToken::new();
    // the first chunk holds two cases of two 10-sample histograms each
    let family = CancelAfter::new(token.clone(), 2 * 10 * 2);

    let mut sink = ResultSink::new(Vec::new());
    let tester = StochasticTester::new(TestRunConfig::new(10, 10, 0.90, 0.91).with_seed(4).with_parallel(true))
        .with_cancellation(token);
    let err = pool.install(|| tester.run_tests(&family, &mut sink)).unwrap_err();
    assert!(matches!(err, StochasticError::Cancelled { completed: 2 }));
    assert_eq!(sink.rows_written(), 2);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let names: Vec<&str> = text.lines().skip(1).map(|l| column(l, 0)).collect();
    assert_eq!(names, vec!["count_empty_add", "count_single_remove"]);
}

#[test]
fn test_fatal_family_error_ends_run() {
    for parallel in [false, true] {
        let family = LosesStorage(CountFamily::new(DEFAULT_EPSILON).unwrap());
        let config = TestRunConfig::new(10, 10, 0.90, 0.91).with_seed(2).with_parallel(parallel);
        let (summary, text) = run_to_string(&family, config);

        let err = summary.unwrap_err();
        assert!(matches!(err, StochasticError::Io { .. }), "{err:?}");
        assert!(!text.contains("count_small_add"));
        assert!(!text.contains("count_small_remove"));
        if !parallel {
            assert_eq!(text.lines().count(), 3);
        }
    }
}

// =============================================================================
// Insufficient noise
// =============================================================================

#[test]
fn test_insufficient_noise_count_is_detected() {
    let leaky = CountFamily::new(DEFAULT_EPSILON).unwrap().with_noise_ratio(1e-6).unwrap();
    let (summary, text) = run_to_string(&leaky, TestRunConfig::new(10, 100, 0.90, 0.91));
    let summary = summary.unwrap();

    // Every add/remove case yields disjoint point masses; the one change
    // case leaves the count untouched.
    assert_eq!(summary.bound_violations, 9);
    assert_eq!(summary.passed, 0);
    let no_overlap = text.lines().skip(1).filter(|l| column(l, 3) == "no_overlap").count();
    assert_eq!(no_overlap, 9);
    let changed = text.lines().find(|l| l.starts_with("count_changed_record,")).unwrap();
    assert_eq!(column(changed, 1), "Count(noise_ratio=0.000001)");
    assert_eq!(column(changed, 3), "1.000000");
}

// =============================================================================
// File sink
// =============================================================================

#[test]
fn test_results_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("stochastic_tester_results_counttest.txt");
    let family = CountFamily::new(DEFAULT_EPSILON).unwrap();

    let file = std::fs::File::create(&path).unwrap();
    let mut sink = ResultSink::new(io::BufWriter::new(file));
    let summary = StochasticTester::new(TestRunConfig::new(10, 50, 0.90, 0.91).with_seed(9))
        .run_tests(&family, &mut sink)
        .unwrap();
    drop(sink);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 11);
    assert_eq!(text.lines().filter(|l| l.contains(",true,10,50,")).count(), summary.passed);
}
