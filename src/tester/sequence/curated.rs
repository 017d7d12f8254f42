//! Hand-curated dataset shapes, one table per family.
//!
//! Case order and content are replayed by the external statistical tester.
//! Append new shapes only after the existing ones and update
//! `AlgorithmFamily::reference_case_count` in the same change.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::algorithms::Bounds;
use crate::tester::dataset::Edit;

/// Per-family salts for seeded dataset content
pub(super) const COUNT_SALT: u64 = 0xC0_07_0000;
pub(super) const SUM_SALT: u64 = 0x50_40_0000;
pub(super) const MEAN_SALT: u64 = 0x3E_A0_0000;

/// Value range used for count records, whose values never matter
pub(super) const COUNT_RANGE: (f64, f64) = (0.0, 100.0);

/// Multiplier placing a record far outside the clamp interval
const FAR: f64 = 1e6;

/// A base dataset and the edit producing its neighbour
#[derive(Debug, Clone)]
pub(super) struct CaseShape {
    pub name: String,
    pub base: Vec<f64>,
    pub edit: Edit,
}

fn shape(name: &str, base: Vec<f64>, edit: Edit) -> CaseShape {
    CaseShape { name: name.to_string(), base, edit }
}

fn add(value: f64) -> Edit {
    Edit::Added { value }
}

fn remove(index: usize) -> Edit {
    Edit::Removed { index }
}

fn change(index: usize, value: f64) -> Edit {
    Edit::Changed { index, value }
}

/// Uniform in [0, 1) from the top 53 bits of one draw
///
/// Built on the raw ChaCha8 output rather than `random_range`, whose
/// sampling algorithm may change between `rand` releases; curated datasets
/// must stay identical for the replaying tester.
fn unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// `len` records uniform in `[lower, upper)`, fixed by `salt` and `index`
pub(super) fn seeded_records(salt: u64, index: usize, len: usize, lower: f64, upper: f64) -> Vec<f64> {
    let seed = salt ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| lower + unit(&mut rng) * (upper - lower)).collect()
}

pub(super) fn count_cases() -> Vec<CaseShape> {
    let (lo, hi) = COUNT_RANGE;
    let small = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    vec![
        shape("count_empty_add", vec![], add(1.0)),
        shape("count_single_remove", vec![1.0], remove(0)),
        shape("count_small_add", small.clone(), add(6.0)),
        shape("count_small_remove", small, remove(4)),
        shape("count_changed_record", vec![1.0, 2.0, 3.0], change(2, 100.0)),
        shape("count_duplicates_add", vec![7.0; 20], add(7.0)),
        shape("count_extreme_values_add", vec![-FAR, 0.0, FAR], add(1e12)),
        shape("count_medium_add", seeded_records(COUNT_SALT, 7, 100, lo, hi), add(1.0)),
        shape("count_large_add", seeded_records(COUNT_SALT, 8, 1000, lo, hi), add(1.0)),
        shape("count_large_remove", seeded_records(COUNT_SALT, 9, 1000, lo, hi), remove(0)),
    ]
}

pub(super) fn sum_cases(bounds: Bounds) -> Vec<CaseShape> {
    let (lo, hi, mid, w) = (bounds.lower, bounds.upper, bounds.midpoint(), bounds.width());
    let q = |t: f64| lo + t * w;
    let three = vec![q(0.55), q(0.6), q(0.65)];
    let five = vec![q(0.55), q(0.6), q(0.65), q(0.7), q(0.75)];
    vec![
        shape("sum_empty_add_upper", vec![], add(hi)),
        shape("sum_empty_add_lower", vec![], add(lo)),
        shape("sum_empty_add_midpoint", vec![], add(mid)),
        shape("sum_single_remove_upper", vec![hi], remove(0)),
        shape("sum_add_above_upper", three.clone(), add(hi + FAR * w)),
        shape("sum_add_below_lower", three.clone(), add(lo - FAR * w)),
        shape("sum_add_at_upper", vec![q(0.75); 10], add(hi)),
        shape("sum_add_at_lower", vec![q(0.25); 10], add(lo)),
        shape("sum_add_small", five.clone(), add(q(0.525))),
        shape("sum_remove_middle", five, remove(2)),
        shape("sum_change_lower_to_upper", vec![lo, mid, hi], change(0, hi)),
        shape("sum_change_small", three, change(2, q(0.675))),
        shape("sum_all_upper_add_upper", vec![hi; 50], add(hi)),
        shape("sum_medium_add_upper", seeded_records(SUM_SALT, 13, 100, lo, hi), add(hi)),
        shape("sum_large_add_upper", seeded_records(SUM_SALT, 14, 1000, lo, hi), add(hi)),
        shape("sum_large_remove", seeded_records(SUM_SALT, 15, 1000, lo, hi), remove(500)),
        shape("sum_large_add_lower", seeded_records(SUM_SALT, 16, 1000, lo, hi), add(lo)),
    ]
}

pub(super) fn mean_cases(bounds: Bounds) -> Vec<CaseShape> {
    let (lo, hi, mid, w) = (bounds.lower, bounds.upper, bounds.midpoint(), bounds.width());
    let q = |t: f64| lo + t * w;
    let three = vec![q(0.1), q(0.2), q(0.3)];
    let mut large_change = seeded_records(MEAN_SALT, 21, 1000, lo, hi);
    large_change[0] = lo;
    vec![
        shape("mean_empty_add_upper", vec![], add(hi)),
        shape("mean_empty_add_lower", vec![], add(lo)),
        shape("mean_empty_add_midpoint", vec![], add(mid)),
        shape("mean_single_remove_upper", vec![hi], remove(0)),
        shape("mean_single_remove_lower", vec![lo], remove(0)),
        shape("mean_pair_add_upper", vec![lo, lo], add(hi)),
        shape("mean_pair_add_lower", vec![hi, hi], add(lo)),
        shape("mean_add_above_upper", three.clone(), add(hi + FAR * w)),
        shape("mean_add_below_lower", three, add(lo - FAR * w)),
        shape("mean_add_midpoint", vec![q(0.1), q(0.2), q(0.3), q(0.4), q(0.5)], add(mid)),
        shape("mean_remove_outlier", vec![q(0.1), q(0.2), q(0.3), hi + FAR * w], remove(3)),
        shape("mean_change_lower_to_upper", vec![lo, mid, hi], change(0, hi)),
        shape("mean_change_small", vec![q(0.4), q(0.5), q(0.6)], change(2, q(0.65))),
        shape("mean_all_lower_add_upper", vec![lo; 20], add(hi)),
        shape("mean_all_upper_add_lower", vec![hi; 20], add(lo)),
        shape("mean_all_midpoint_add_upper", vec![mid; 20], add(hi)),
        shape("mean_medium_add_upper", seeded_records(MEAN_SALT, 16, 100, lo, hi), add(hi)),
        shape("mean_medium_remove", seeded_records(MEAN_SALT, 17, 100, lo, hi), remove(50)),
        shape("mean_large_add_upper", seeded_records(MEAN_SALT, 18, 1000, lo, hi), add(hi)),
        shape("mean_large_add_lower", seeded_records(MEAN_SALT, 19, 1000, lo, hi), add(lo)),
        shape("mean_large_remove", seeded_records(MEAN_SALT, 20, 1000, lo, hi), remove(0)),
        shape("mean_large_change_lower_to_upper", large_change, change(0, hi)),
    ]
}
