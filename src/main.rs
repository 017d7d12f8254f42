//! dp-stochastic CLI
//!
//! Runs the stochastic differential-privacy tester against the count,
//! bounded sum and bounded mean algorithms.
//!
//! # Usage
//!
//! ```bash
//! # Reference run, results under testing/evaluation/results/
//! dp-stochastic run
//!
//! # Explicit result files and corridor
//! dp-stochastic run count.txt sum.txt mean.txt --ratio-min 0.9 --ratio-max 0.91
//!
//! # Reproducible run of a leaky count variant
//! dp-stochastic run --families count --noise-ratio 0.1 --seed 7
//!
//! # Validate config
//! dp-stochastic validate --config tester.yaml
//!
//! # Inspect the generated sequence
//! dp-stochastic cases sum --num-datasets 40
//! ```

use clap::Parser;
use dp_stochastic::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
