//! Run command implementation

use chrono::Utc;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use dp_stochastic_common::{OutputFormat, Result, StochasticError, TableBuilder};

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_result_files, resolve_config, RunArgs, TesterConfig};
use crate::tester::{AlgorithmFamily, FamilyUnderTest, ResultSink, StochasticTester, SummaryResults};

/// Result of one family run, successful or not
#[derive(Debug)]
pub struct FamilyOutcome {
    pub family: AlgorithmFamily,
    pub path: PathBuf,
    pub result: std::result::Result<SummaryResults, String>,
}

pub fn run_run(args: RunArgs, level: LogLevel) -> std::result::Result<(), String> {
    let config = prepare(&args).map_err(|e| format!("[{}] {e}", e.code()))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Corridor [{}, {}], {} samples per histogram, epsilon {:.6}",
            config.ratio_min, config.ratio_max, config.num_samples_per_histogram, config.epsilon
        ),
    );

    let outcomes = run_families(&config).map_err(|e| format!("[{}] {e}", e.code()))?;
    report(&config, &outcomes, args.format, level);

    let failures: Vec<String> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {e}", o.family)))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} family run(s) failed:\n{}", failures.len(), failures.join("\n")))
    }
}

/// Resolve and validate the configuration; no file is touched
pub fn prepare(args: &RunArgs) -> Result<TesterConfig> {
    let mut config = resolve_config(&args.tester)?;
    apply_result_files(&mut config, &args.files)?;
    config.validate()?;
    Ok(config)
}

/// Run every configured family, each with its own result file
///
/// Families are built before any file is opened so setup errors abort the
/// whole invocation. Errors after that are reported per family. In parallel
/// mode families share the rayon pool their cases run on; outcomes keep
/// configuration order either way.
pub fn run_families(config: &TesterConfig) -> Result<Vec<FamilyOutcome>> {
    let families = config
        .families
        .iter()
        .map(|&family| Ok((family, config.family_under_test(family)?)))
        .collect::<Result<Vec<_>>>()?;

    let outcome = |(family, under_test): &(AlgorithmFamily, Box<dyn FamilyUnderTest>)| FamilyOutcome {
        family: *family,
        path: config.results_path(*family),
        result: run_family(config, *family, under_test.as_ref()),
    };
    let outcomes: Vec<FamilyOutcome> = if config.parallel {
        families.par_iter().map(outcome).collect()
    } else {
        families.iter().map(outcome).collect()
    };
    Ok(outcomes)
}

fn run_family(
    config: &TesterConfig,
    family: AlgorithmFamily,
    under_test: &dyn FamilyUnderTest,
) -> std::result::Result<SummaryResults, String> {
    run_family_inner(config, family, under_test).map_err(|e| format!("[{}] {e}", e.code()))
}

fn run_family_inner(
    config: &TesterConfig,
    family: AlgorithmFamily,
    under_test: &dyn FamilyUnderTest,
) -> Result<SummaryResults> {
    let path = config.results_path(family);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| StochasticError::io(format!("creating {}", parent.display()), e))?;
    }
    let file = File::create(&path)
        .map_err(|e| StochasticError::io(format!("creating {}", path.display()), e))?;

    let mut sink = ResultSink::new(BufWriter::new(file));
    StochasticTester::new(config.run_config(family)).run_tests(under_test, &mut sink)
}

fn report(config: &TesterConfig, outcomes: &[FamilyOutcome], format: OutputFormat, level: LogLevel) {
    match format {
        OutputFormat::Json => {
            let families: Vec<serde_json::Value> = outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(summary) => serde_json::json!({
                        "family": o.family,
                        "results_file": o.path,
                        "summary": summary,
                        "pass_rate": summary.pass_rate(),
                    }),
                    Err(e) => serde_json::json!({
                        "family": o.family,
                        "results_file": o.path,
                        "error": e,
                    }),
                })
                .collect();
            let report = serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "ratio_min": config.ratio_min,
                "ratio_max": config.ratio_max,
                "num_samples_per_histogram": config.num_samples_per_histogram,
                "epsilon": config.epsilon,
                "noise_ratio": config.noise_ratio,
                "seed": config.seed,
                "families": families,
            });
            if let Ok(json_str) = serde_json::to_string_pretty(&report) {
                println!("{json_str}");
            }
        }
        OutputFormat::Text => {
            let mut builder = TableBuilder::new()
                .title(format!("Stochastic tester ({})", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")))
                .headers(vec!["Family", "Passed", "Failed", "Errored", "Bound violations", "Pass rate", "Results"]);
            for outcome in outcomes {
                let path = outcome.path.display().to_string();
                builder = match &outcome.result {
                    Ok(s) => builder.row(vec![
                        s.family.to_string(),
                        s.passed.to_string(),
                        s.failed.to_string(),
                        s.errored.to_string(),
                        s.bound_violations.to_string(),
                        format!("{:.1}%", s.pass_rate() * 100.0),
                        path,
                    ]),
                    Err(_) => builder.row(vec![
                        outcome.family.to_string(),
                        "-".into(),
                        "-".into(),
                        "-".into(),
                        "-".into(),
                        "error".into(),
                        path,
                    ]),
                };
            }
            log(level, LogLevel::Normal, &builder.build().to_string());
        }
    }
}
