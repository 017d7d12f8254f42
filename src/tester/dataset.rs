//! Datasets and neighbouring dataset pairs.

use serde::Serialize;
use std::fmt;

use dp_stochastic_common::{Result, StochasticError};

/// Immutable ordered sequence of records
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    records: Vec<f64>,
}

impl Dataset {
    /// Wrap a vector of records
    pub fn new(records: Vec<f64>) -> Self {
        Self { records }
    }

    /// Dataset without records
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records in order
    pub fn records(&self) -> &[f64] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<f64>> for Dataset {
    fn from(records: Vec<f64>) -> Self {
        Self::new(records)
    }
}

/// The single-record difference between a base dataset and its neighbour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Edit {
    /// Neighbour appends `value`
    Added { value: f64 },
    /// Neighbour drops the record at `index`
    Removed { index: usize },
    /// Neighbour replaces the record at `index` with `value`
    Changed { index: usize, value: f64 },
}

impl Edit {
    /// Number of add/remove steps the edit amounts to
    ///
    /// A substitution is a removal followed by an addition.
    pub fn group_size(&self) -> u32 {
        match self {
            Self::Added { .. } | Self::Removed { .. } => 1,
            Self::Changed { .. } => 2,
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { value } => write!(f, "add {value}"),
            Self::Removed { index } => write!(f, "remove #{index}"),
            Self::Changed { index, value } => write!(f, "change #{index} -> {value}"),
        }
    }
}

/// Two datasets at structural distance exactly one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborPair {
    base: Dataset,
    neighbor: Dataset,
    edit: Edit,
}

impl NeighborPair {
    /// Derive the neighbour by applying `edit` to `base`
    pub fn new(base: Dataset, edit: Edit) -> Result<Self> {
        let mut records = base.records.clone();
        match edit {
            Edit::Added { value } => records.push(value),
            Edit::Removed { index } => {
                Self::check_index(&base, index)?;
                records.remove(index);
            }
            Edit::Changed { index, value } => {
                Self::check_index(&base, index)?;
                if records[index] == value {
                    return Err(StochasticError::config(
                        "dataset",
                        format!("changing record #{index} to the same value {value} is not an edit"),
                    ));
                }
                records[index] = value;
            }
        }
        Ok(Self { base, neighbor: Dataset::new(records), edit })
    }

    fn check_index(base: &Dataset, index: usize) -> Result<()> {
        if index < base.len() {
            Ok(())
        } else {
            Err(StochasticError::config(
                "dataset",
                format!("record index {index} out of range for {} records", base.len()),
            ))
        }
    }

    pub fn base(&self) -> &Dataset {
        &self.base
    }

    pub fn neighbor(&self) -> &Dataset {
        &self.neighbor
    }

    pub fn edit(&self) -> &Edit {
        &self.edit
    }
}

/// Minimum number of single-record insertions, deletions or substitutions
/// turning `a` into `b`
pub fn structural_distance(a: &Dataset, b: &Dataset) -> usize {
    let (a, b) = (a.records(), b.records());
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }

    // Levenshtein over the differing middle section
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(x != y);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
