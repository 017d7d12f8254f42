//! Error types for the algorithms under test.

use thiserror::Error;

/// Algorithm errors
#[derive(Debug, Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{algorithm} produced a non-finite output: {value}")]
    NonFiniteOutput { algorithm: &'static str, value: f64 },
}

/// Result type for algorithm operations
pub type Result<T> = std::result::Result<T, AlgorithmError>;
