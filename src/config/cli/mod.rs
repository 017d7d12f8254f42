//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! dp-stochastic run
//! dp-stochastic run count.txt sum.txt mean.txt --ratio-min 0.9 --ratio-max 0.91
//! dp-stochastic run --config tester.yaml --seed 7 --parallel --format json
//! dp-stochastic validate --config tester.yaml
//! dp-stochastic cases mean --num-datasets 30
//! ```

mod core;

pub use core::{
    apply_overrides, apply_result_files, parse_args, resolve_config, CasesArgs, Cli, Command,
    RunArgs, TesterArgs, ValidateArgs,
};
