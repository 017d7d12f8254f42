//! CLI module for dp-stochastic
//!
//! This module contains all CLI command handlers and utilities.

mod commands;
mod logging;

pub use commands::{prepare, run_command, run_families, FamilyOutcome};
pub use logging::{init_tracing, log, LogLevel};

// Re-export Cli from config for convenience
pub use crate::config::Cli;
