//! Configuration: YAML file, defaults and command-line overrides.

pub mod cli;
mod tester;

pub use cli::{
    apply_overrides, apply_result_files, parse_args, resolve_config, CasesArgs, Cli, Command,
    RunArgs, TesterArgs, ValidateArgs,
};
pub use tester::{load_config, FamilySettings, TesterConfig, DEFAULT_OUTPUT_DIR};
