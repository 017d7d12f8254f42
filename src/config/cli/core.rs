//! Core CLI types - Cli, Command, and argument structs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use dp_stochastic_common::{OutputFormat, Result, StochasticError};

use crate::config::{load_config, TesterConfig};
use crate::tester::AlgorithmFamily;

/// dp-stochastic: statistical acceptance harness for DP aggregations
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "dp-stochastic")]
#[command(version)]
#[command(
    about = "Stochastic differential-privacy tester for noisy count, bounded sum and bounded mean"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the stochastic tester and write one result file per family
    Run(RunArgs),

    /// Validate the configuration without sampling anything
    Validate(ValidateArgs),

    /// List the generated test cases of a family
    Cases(CasesArgs),
}

/// Options shared by every command that builds a configuration
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TesterArgs {
    /// YAML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lower end of the acceptance corridor
    #[arg(long)]
    pub ratio_min: Option<f64>,

    /// Upper end of the acceptance corridor
    #[arg(long)]
    pub ratio_max: Option<f64>,

    /// Samples drawn per histogram
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Privacy budget of the algorithms under test
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Families to run, comma separated
    #[arg(long, value_delimiter = ',')]
    pub families: Option<Vec<AlgorithmFamily>>,

    /// Scale the noise down to test an insufficient-noise variant
    #[arg(long)]
    pub noise_ratio: Option<f64>,

    /// Directory for result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Evaluate cases and families in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Result files for count, sum and mean, in that order
    #[arg(value_name = "FILE", num_args = 0..=3)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub tester: TesterArgs,

    /// Summary format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub tester: TesterArgs,

    /// Print the resolved configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the cases command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CasesArgs {
    /// Algorithm family (count, sum, mean)
    #[arg(value_name = "FAMILY")]
    pub family: String,

    /// Number of cases to generate; defaults to the curated table size
    #[arg(long)]
    pub num_datasets: Option<usize>,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listing format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from an iterator
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a TesterConfig
pub fn apply_overrides(config: &mut TesterConfig, args: &TesterArgs) {
    if let Some(ratio_min) = args.ratio_min {
        config.ratio_min = ratio_min;
    }
    if let Some(ratio_max) = args.ratio_max {
        config.ratio_max = ratio_max;
    }
    if let Some(samples) = args.samples {
        config.num_samples_per_histogram = samples;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(families) = &args.families {
        config.families = families.clone();
    }
    if let Some(noise_ratio) = args.noise_ratio {
        config.noise_ratio = noise_ratio;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if args.parallel {
        config.parallel = true;
    }
}

/// Point each family at its positional result file
///
/// Either none or all three files must be given.
pub fn apply_result_files(config: &mut TesterConfig, files: &[PathBuf]) -> Result<()> {
    match files.len() {
        0 => Ok(()),
        3 => {
            for (family, file) in AlgorithmFamily::ALL.into_iter().zip(files) {
                config.settings_mut(family).results_file = Some(file.clone());
            }
            Ok(())
        }
        n => Err(StochasticError::config(
            "files",
            format!("expected result files for count, sum and mean (3), got {n}"),
        )),
    }
}

/// Load the configuration file if any, then apply the flags on top
pub fn resolve_config(args: &TesterArgs) -> Result<TesterConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TesterConfig::default(),
    };
    apply_overrides(&mut config, args);
    Ok(config)
}
