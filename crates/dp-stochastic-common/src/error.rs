//! Error types with actionable diagnostics.
//!
//! Every variant carries enough context to tell the user what went wrong and
//! what to change, without consulting external documentation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dp-stochastic operations.
pub type Result<T> = std::result::Result<T, StochasticError>;

/// Errors raised by the stochastic tester and its command-line surface.
#[derive(Error, Debug)]
pub enum StochasticError {
    /// The requested algorithm family is not known to the harness.
    #[error("Unsupported algorithm family: {name}\n  → Supported families: count, sum, mean")]
    UnsupportedFamily { name: String },

    /// A run parameter is outside its valid domain.
    #[error("Invalid configuration value for '{field}': {message}\n  → Fix the value and rerun; no test was executed")]
    Configuration { field: String, message: String },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// The algorithm under test failed while producing a sample.
    #[error("Algorithm '{algorithm}' failed during sampling: {message}")]
    AlgorithmInvocation { algorithm: String, message: String },

    /// The result sink rejected a write.
    #[error("Result sink write failed: {context}\n  Cause: {source}\n  → Check disk space and permissions of the output directory")]
    SinkWrite {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled between test cases.
    #[error("Run cancelled after {completed} completed test case(s)")]
    Cancelled { completed: usize },
}

impl StochasticError {
    /// Create a configuration error for a named field.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { field: field.into(), message: message.into() }
    }

    /// Create a sink write error with context.
    pub fn sink(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::SinkWrite { context: context.into(), source }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Whether this error must abort the whole family run.
    ///
    /// Invocation errors are recorded against a single test case instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AlgorithmInvocation { .. })
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFamily { .. } => "E001",
            Self::Configuration { .. } => "E002",
            Self::ConfigParsing { .. } => "E003",
            Self::AlgorithmInvocation { .. } => "E010",
            Self::SinkWrite { .. } => "E020",
            Self::Io { .. } => "E021",
            Self::Cancelled { .. } => "E030",
        }
    }
}
