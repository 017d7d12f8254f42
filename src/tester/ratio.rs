//! Bucket-wise probability ratio between two histograms.
//!
//! For every bucket observed in both histograms the ratio
//! `P(b | base) / P(b | neighbor)` is estimated from relative frequencies.
//! A bucket seen on one side only has no finite ratio in either direction;
//! it is skipped on both sides and its mass reported separately, which
//! keeps the evaluation symmetric under swapping the inputs.

use serde::Serialize;

use super::histogram::Histogram;

/// Outcome of comparing two histograms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioEvaluation {
    /// Compared-bucket ratio furthest from one, if any bucket was comparable
    pub actual_ratio: Option<f64>,
    /// Whether `actual_ratio` lies inside the acceptance corridor
    pub passed: bool,
    /// Bucket that produced `actual_ratio`
    pub worst_bucket: Option<i64>,
    /// Number of buckets observed on both sides
    pub compared_buckets: usize,
    /// Larger of the two sides' probability mass in skipped buckets
    pub unmatched_mass: f64,
}

/// Compare `base` against `neighbor` and check the worst ratio against
/// `[ratio_min, ratio_max]`
pub fn evaluate(
    base: &Histogram,
    neighbor: &Histogram,
    ratio_min: f64,
    ratio_max: f64,
) -> RatioEvaluation {
    let mut worst: Option<(i64, f64, f64)> = None;
    let mut compared_buckets = 0;
    let mut base_unmatched = 0u64;

    for (key, base_count) in base.iter() {
        let neighbor_count = neighbor.get(key);
        if neighbor_count == 0 {
            base_unmatched += base_count;
            continue;
        }
        compared_buckets += 1;
        let (p, q) = (base.probability(key), neighbor.probability(key));
        let ratio = p / q;
        // exact negation under swap, so both directions pick the same bucket
        let deviation = (p.ln() - q.ln()).abs();
        // strict comparison keeps the lowest key on ties
        if worst.is_none_or(|(_, _, d)| deviation > d) {
            worst = Some((key, ratio, deviation));
        }
    }

    let neighbor_unmatched: u64 =
        neighbor.iter().filter(|(key, _)| base.get(*key) == 0).map(|(_, c)| c).sum();
    let unmatched_mass = share(base_unmatched, base.total()).max(share(neighbor_unmatched, neighbor.total()));

    let actual_ratio = worst.map(|(_, ratio, _)| ratio);
    RatioEvaluation {
        actual_ratio,
        passed: actual_ratio.is_some_and(|r| (ratio_min..=ratio_max).contains(&r)),
        worst_bucket: worst.map(|(key, _, _)| key),
        compared_buckets,
        unmatched_mass,
    }
}

fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist(pairs: &[(i64, u64)]) -> Histogram {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_identical_histograms_have_unit_ratio() {
        let h = hist(&[(0, 10), (1, 30), (2, 60)]);
        let eval = evaluate(&h, &h, 0.9, 1.1);
        assert_relative_eq!(eval.actual_ratio.unwrap(), 1.0);
        assert!(eval.passed);
        assert_eq!(eval.compared_buckets, 3);
        assert_eq!(eval.unmatched_mass, 0.0);
    }

    #[test]
    fn test_worst_bucket_is_selected() {
        let base = hist(&[(0, 50), (1, 40), (2, 10)]);
        let neighbor = hist(&[(0, 50), (1, 20), (2, 30)]);
        let eval = evaluate(&base, &neighbor, 0.9, 0.91);

        // bucket 1: 2.0 (|ln| 0.693), bucket 2: 1/3 (|ln| 1.099)
        assert_eq!(eval.worst_bucket, Some(2));
        assert_relative_eq!(eval.actual_ratio.unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert!(!eval.passed);
    }

    #[test]
    fn test_swap_inverts_ratio() {
        let base = hist(&[(0, 12), (1, 50), (2, 38)]);
        let neighbor = hist(&[(0, 30), (1, 45), (2, 25)]);
        let forward = evaluate(&base, &neighbor, 0.1, 0.9).actual_ratio.unwrap();
        let backward = evaluate(&neighbor, &base, 0.1, 0.9).actual_ratio.unwrap();
        assert_relative_eq!(forward, 1.0 / backward, epsilon = 1e-12);
    }

    #[test]
    fn test_one_sided_buckets_are_skipped() {
        let base = hist(&[(0, 50), (1, 50)]);
        let neighbor = hist(&[(1, 50), (2, 50)]);
        let eval = evaluate(&base, &neighbor, 0.5, 0.99);

        assert_eq!(eval.compared_buckets, 1);
        assert_relative_eq!(eval.actual_ratio.unwrap(), 1.0);
        assert_relative_eq!(eval.unmatched_mass, 0.5);
        assert!(!eval.passed);
    }

    #[test]
    fn test_disjoint_histograms_have_no_ratio() {
        let eval = evaluate(&hist(&[(0, 5)]), &hist(&[(1, 5)]), 0.1, 0.9);
        assert_eq!(eval.actual_ratio, None);
        assert!(!eval.passed);
        assert_eq!(eval.worst_bucket, None);
        assert_relative_eq!(eval.unmatched_mass, 1.0);
    }

    #[test]
    fn test_empty_histograms() {
        let eval = evaluate(&Histogram::default(), &Histogram::default(), 0.1, 0.9);
        assert_eq!(eval.actual_ratio, None);
        assert_eq!(eval.unmatched_mass, 0.0);
    }

    #[test]
    fn test_corridor_is_inclusive() {
        let base = hist(&[(0, 9), (1, 11)]);
        let neighbor = hist(&[(0, 10), (1, 10)]);
        // bucket 0: 0.9, bucket 1: 1.1; |ln 0.9| > |ln 1.1|
        let eval = evaluate(&base, &neighbor, 0.9, 0.91);
        assert_relative_eq!(eval.actual_ratio.unwrap(), 0.9, epsilon = 1e-12);
        assert!(eval.passed);
    }

    #[test]
    fn test_worst_bucket_ties_go_to_lowest_key() {
        let base = hist(&[(0, 80), (1, 20)]);
        let neighbor = hist(&[(0, 20), (1, 80)]);
        let eval = evaluate(&base, &neighbor, 0.1, 0.9);
        assert_eq!(eval.worst_bucket, Some(0));
        assert_relative_eq!(eval.actual_ratio.unwrap(), 4.0, epsilon = 1e-12);
    }
}
