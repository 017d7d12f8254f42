//! Halton low-discrepancy sequence.
//!
//! Coordinate `d` of point `i` is the radical inverse of `i` in the `d`-th
//! prime base. Points spread evenly over the unit cube without any random
//! state, so the sequence is identical on every platform.

const PRIMES: [u64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];

/// Radical inverse of `index` in `base`, in [0, 1)
pub fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut scale = inv_base;
    let mut result = 0.0;
    while index > 0 {
        result += (index % base) as f64 * scale;
        index /= base;
        scale *= inv_base;
    }
    result
}

/// Halton sequence over a fixed number of coordinates
#[derive(Debug, Clone)]
pub struct HaltonSequence {
    dimensions: usize,
}

impl HaltonSequence {
    /// Sequence over `dimensions` coordinates, at most 8
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.clamp(1, PRIMES.len()) }
    }

    /// Point at an arbitrary index
    pub fn point(&self, index: u64) -> Vec<f64> {
        PRIMES[..self.dimensions].iter().map(|&base| radical_inverse(index, base)).collect()
    }
}
