//! Per-case results and per-family summaries.

use serde::Serialize;
use std::fmt;

use super::family::AlgorithmFamily;

/// Header line of every result file
pub const CSV_HEADER: &str =
    "test_name,algorithm,expected,actual,ratio,num_datasets,num_samples,time(sec)";

/// What was measured for a case
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Measurement {
    /// Worst-case empirical bucket ratio
    Ratio(f64),
    /// The two histograms shared no bucket
    NoOverlap,
    /// The algorithm failed while sampling
    Error(String),
}

impl Measurement {
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Ratio(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratio(r) => write!(f, "{r:.6}"),
            Self::NoOverlap => f.write_str("no_overlap"),
            // keep the row a single CSV line
            Self::Error(message) => {
                let cleaned: String = message
                    .chars()
                    .map(|c| if matches!(c, ',' | '\n' | '\r') { ' ' } else { c })
                    .collect();
                write!(f, "error: {}", cleaned.trim())
            }
        }
    }
}

/// Verdict for one test case; written once, never updated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioResult {
    pub test_name: String,
    pub algorithm: String,
    pub expected_ratio: f64,
    pub actual_ratio: Measurement,
    pub passed: bool,
    pub num_datasets: usize,
    pub num_samples: usize,
    pub elapsed_seconds: f64,
}

impl RatioResult {
    /// Whether the empirical ratio broke the theoretical ceiling
    ///
    /// Disjoint histograms count as a violation; errors do not.
    pub fn exceeds_bound(&self) -> bool {
        match &self.actual_ratio {
            Measurement::Ratio(r) => *r > self.expected_ratio || *r < 1.0 / self.expected_ratio,
            Measurement::NoOverlap => true,
            Measurement::Error(_) => false,
        }
    }

    /// Row without the trailing time column, stable across repeated seeded runs
    pub fn deterministic_fields(&self) -> String {
        format!(
            "{},{},{:.6},{},{},{},{}",
            self.test_name,
            self.algorithm,
            self.expected_ratio,
            self.actual_ratio,
            self.passed,
            self.num_datasets,
            self.num_samples
        )
    }

    /// One result-file line, without the newline
    pub fn to_csv_row(&self) -> String {
        format!("{},{:.6}", self.deterministic_fields(), self.elapsed_seconds)
    }
}

/// Pass/fail tally for one family run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryResults {
    pub family: AlgorithmFamily,
    pub passed: usize,
    pub failed: usize,
    /// Failures caused by invocation errors
    pub errored: usize,
    /// Cases whose ratio left the theoretical bound
    pub bound_violations: usize,
}

impl SummaryResults {
    pub fn new(family: AlgorithmFamily) -> Self {
        Self { family, passed: 0, failed: 0, errored: 0, bound_violations: 0 }
    }

    /// Fold one result into the tally
    pub fn absorb(mut self, result: &RatioResult) -> Self {
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        if result.actual_ratio.is_error() {
            self.errored += 1;
        }
        if result.exceeds_bound() {
            self.bound_violations += 1;
        }
        self
    }

    /// Combine tallies of disjoint case sets for the same family
    pub fn merge(self, other: Self) -> Self {
        debug_assert_eq!(self.family, other.family);
        Self {
            family: self.family,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            errored: self.errored + other.errored,
            bound_violations: self.bound_violations + other.bound_violations,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Fraction of cases that passed; zero for an empty run
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passed as f64 / self.total() as f64
        }
    }
}

impl fmt::Display for SummaryResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} passed ({:.1}%), {} errored, {} bound violation(s)",
            self.family,
            self.passed,
            self.total(),
            self.pass_rate() * 100.0,
            self.errored,
            self.bound_violations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, actual: Measurement, passed: bool) -> RatioResult {
        RatioResult {
            test_name: name.to_string(),
            algorithm: "Count".to_string(),
            expected_ratio: 3.0,
            actual_ratio: actual,
            passed,
            num_datasets: 10,
            num_samples: 100,
            elapsed_seconds: 0.25,
        }
    }

    #[test]
    fn test_csv_row_has_header_arity() {
        let row = result("count_empty_add", Measurement::Ratio(0.905), true).to_csv_row();
        assert_eq!(row, "count_empty_add,Count,3.000000,0.905000,true,10,100,0.250000");
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
    }

    #[test]
    fn test_error_diagnostic_is_single_field() {
        let row = result("x", Measurement::Error("bad, worse\nworst".into()), false).to_csv_row();
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
        assert!(row.contains("error: bad  worse worst"));
    }

    #[test]
    fn test_no_overlap_cell() {
        let row = result("x", Measurement::NoOverlap, false).to_csv_row();
        assert!(row.contains(",no_overlap,false,"));
    }

    #[test]
    fn test_exceeds_bound() {
        assert!(!result("a", Measurement::Ratio(2.5), false).exceeds_bound());
        assert!(result("b", Measurement::Ratio(3.5), false).exceeds_bound());
        assert!(result("c", Measurement::Ratio(0.2), false).exceeds_bound());
        assert!(result("d", Measurement::NoOverlap, false).exceeds_bound());
        assert!(!result("e", Measurement::Error("x".into()), false).exceeds_bound());
    }

    #[test]
    fn test_summary_fold() {
        let results = [
            result("a", Measurement::Ratio(0.905), true),
            result("b", Measurement::Ratio(4.0), false),
            result("c", Measurement::Error("boom".into()), false),
        ];
        let summary = results.iter().fold(SummaryResults::new(AlgorithmFamily::Count), SummaryResults::absorb);

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.bound_violations, 1);
        assert_eq!(summary.total(), 3);
        assert!((summary.pass_rate() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_merge() {
        let a = SummaryResults::new(AlgorithmFamily::Sum).absorb(&result("a", Measurement::Ratio(0.9), true));
        let b = SummaryResults::new(AlgorithmFamily::Sum).absorb(&result("b", Measurement::NoOverlap, false));
        let merged = a.merge(b);
        assert_eq!((merged.passed, merged.failed, merged.bound_violations), (1, 1, 1));
    }

    #[test]
    fn test_empty_summary_pass_rate() {
        let summary = SummaryResults::new(AlgorithmFamily::Mean);
        assert_eq!(summary.pass_rate(), 0.0);
        assert!(summary.to_string().starts_with("mean: 0/0 passed"));
    }
}
