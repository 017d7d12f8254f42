//! CLI command implementations

mod cases;
mod run;
mod validate;


pub use run::{prepare, run_families, FamilyOutcome};

use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);
    init_tracing(log_level);

    match cli.command {
        Command::Run(args) => run::run_run(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Cases(args) => cases::run_cases(args, log_level),
    }
}
