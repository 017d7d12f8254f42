//! Dataset sequence generation.
//!
//! Each family starts with its curated case table. Requests beyond the
//! table append cases placed by a Halton sequence over (dataset size,
//! record magnitude, edit kind). Nothing here draws from an unseeded
//! source, so a generator with the same parameters always returns the same
//! sequence.

mod curated;
mod halton;

pub use halton::{radical_inverse, HaltonSequence};

use serde::Serialize;
use tracing::debug;

use dp_stochastic_common::{Result, StochasticError};

use self::curated::{CaseShape, COUNT_RANGE, COUNT_SALT, MEAN_SALT, SUM_SALT};
use super::dataset::{Dataset, Edit, NeighborPair};
use super::family::AlgorithmFamily;
use crate::algorithms::Bounds;

/// Largest dataset the Halton extension produces
const MAX_EXTENSION_SIZE: f64 = 1000.0;

/// One neighbouring pair and its theoretical ratio ceiling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub name: String,
    pub family: AlgorithmFamily,
    pub neighbor_pair: NeighborPair,
    pub expected_ratio_bound: f64,
}

/// `exp(epsilon * k)` where `k` counts the add/remove steps of `edit`
pub fn expected_ratio_bound(epsilon: f64, edit: &Edit) -> f64 {
    (epsilon * f64::from(edit.group_size())).exp()
}

/// Builds the deterministic test-case sequence of each family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceGenerator {
    epsilon: f64,
    sum_bounds: Bounds,
    mean_bounds: Bounds,
}

impl SequenceGenerator {
    /// Clamp interval of the reference sum configuration
    pub const REFERENCE_SUM_BOUNDS: Bounds = Bounds { lower: -10.0, upper: 10.0 };
    /// Clamp interval of the reference mean configuration
    pub const REFERENCE_MEAN_BOUNDS: Bounds = Bounds { lower: 0.0, upper: 10.0 };

    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            sum_bounds: Self::REFERENCE_SUM_BOUNDS,
            mean_bounds: Self::REFERENCE_MEAN_BOUNDS,
        }
    }

    pub fn with_sum_bounds(mut self, bounds: Bounds) -> Self {
        self.sum_bounds = bounds;
        self
    }

    pub fn with_mean_bounds(mut self, bounds: Bounds) -> Self {
        self.mean_bounds = bounds;
        self
    }

    /// Generate for a family given by name
    pub fn generate_named(&self, family: &str, num_datasets: usize) -> Result<Vec<TestCase>> {
        self.generate(family.parse()?, num_datasets)
    }

    /// First `num_datasets` cases of `family`'s sequence
    pub fn generate(&self, family: AlgorithmFamily, num_datasets: usize) -> Result<Vec<TestCase>> {
        if num_datasets == 0 {
            return Err(StochasticError::config("num_datasets", "must be greater than 0"));
        }

        let mut shapes = self.curated(family);
        shapes.truncate(num_datasets);
        let curated_len = shapes.len();
        let extension = HaltonSequence::new(3);
        for index in curated_len..num_datasets {
            let point = extension.point((index - curated_len + 1) as u64);
            shapes.push(self.extension_case(family, index, &point));
        }

        debug!(family = %family, curated = curated_len, total = shapes.len(), "generated test sequence");

        shapes
            .into_iter()
            .map(|shape| {
                let neighbor_pair = NeighborPair::new(Dataset::new(shape.base), shape.edit)?;
                Ok(TestCase {
                    name: shape.name,
                    family,
                    expected_ratio_bound: expected_ratio_bound(self.epsilon, neighbor_pair.edit()),
                    neighbor_pair,
                })
            })
            .collect()
    }

    fn curated(&self, family: AlgorithmFamily) -> Vec<CaseShape> {
        match family {
            AlgorithmFamily::Count => curated::count_cases(),
            AlgorithmFamily::Sum => curated::sum_cases(self.sum_bounds),
            AlgorithmFamily::Mean => curated::mean_cases(self.mean_bounds),
        }
    }

    fn extension_case(&self, family: AlgorithmFamily, index: usize, point: &[f64]) -> CaseShape {
        let (salt, lower, upper) = match family {
            AlgorithmFamily::Count => (COUNT_SALT, COUNT_RANGE.0, COUNT_RANGE.1),
            AlgorithmFamily::Sum => (SUM_SALT, self.sum_bounds.lower, self.sum_bounds.upper),
            AlgorithmFamily::Mean => (MEAN_SALT, self.mean_bounds.lower, self.mean_bounds.upper),
        };
        let width = upper - lower;
        let size = (point[0] * MAX_EXTENSION_SIZE) as usize;
        let base = curated::seeded_records(salt, index, size, lower, upper);
        // Values reach half a width past either bound to exercise clamping
        let value = lower - 0.5 * width + point[1] * 2.0 * width;
        let position = ((point[1] * size as f64) as usize).min(size.saturating_sub(1));

        let edit = if size == 0 || point[2] < 1.0 / 3.0 {
            Edit::Added { value }
        } else if point[2] < 2.0 / 3.0 {
            Edit::Removed { index: position }
        } else if base[position] == value {
            Edit::Added { value }
        } else {
            Edit::Changed { index: position, value }
        };

        CaseShape { name: format!("{family}_halton_{index:03}"), base, edit }
    }
}
