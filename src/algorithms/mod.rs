//! Differentially private aggregations under test.
//!
//! Each algorithm accumulates records with [`Algorithm::add_record`] and
//! releases one noisy value per [`Algorithm::result`] call. Noise comes from
//! the caller's RNG so the harness controls every random stream.
//!
//! # Example
//!
//! ```
//! use dp_stochastic::algorithms::{Algorithm, Count, DEFAULT_EPSILON};
//! use rand::SeedableRng;
//!
//! let mut count = Count::new(DEFAULT_EPSILON).unwrap();
//! for record in [1.0, 2.0, 3.0] {
//!     count.add_record(record);
//! }
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let noisy = count.result(&mut rng).unwrap();
//! assert_eq!(noisy, noisy.round());
//! ```

pub mod bounds;
pub mod count;
pub mod error;
pub mod laplace;
pub mod mean;
pub mod sum;


use rand::RngCore;

pub use bounds::Bounds;
pub use count::Count;
pub use error::{AlgorithmError, Result};
pub use laplace::LaplaceMechanism;
pub use mean::BoundedMean;
pub use sum::BoundedSum;

/// Reference privacy budget, `ln 3`
pub const DEFAULT_EPSILON: f64 = 1.098_612_288_668_109_8;

/// An epsilon-DP aggregation with add-record / release semantics
pub trait Algorithm {
    /// Display name, used in result rows
    fn name(&self) -> &'static str;

    /// Configured privacy budget
    fn epsilon(&self) -> f64;

    /// Accumulate one record
    fn add_record(&mut self, record: f64);

    /// Accumulate every record of a slice
    fn add_records(&mut self, records: &[f64]) {
        for &record in records {
            self.add_record(record);
        }
    }

    /// Release one noisy output from the accumulated state
    fn result(&mut self, rng: &mut dyn RngCore) -> Result<f64>;
}
