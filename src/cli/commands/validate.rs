//! Validate command implementation

use dp_stochastic_common::TableBuilder;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{resolve_config, TesterConfig, ValidateArgs};
use crate::tester::AlgorithmFamily;

/// Per-family settings as display rows
pub fn format_family_settings(config: &TesterConfig) -> String {
    let mut builder = TableBuilder::new()
        .title("Families")
        .headers(vec!["Family", "Datasets", "Bucket width", "Bounds", "Results"]);
    for family in AlgorithmFamily::ALL {
        let settings = config.settings(family);
        let width = match (family, settings.bucket_width) {
            (AlgorithmFamily::Count, _) => "exact".to_string(),
            (_, Some(width)) => width.to_string(),
            (_, None) => "default".to_string(),
        };
        let bounds = settings
            .bounds
            .map_or_else(|| "default".to_string(), |b| format!("[{}, {}]", b.lower, b.upper));
        let enabled = if config.families.contains(&family) { "" } else { " (skipped)" };
        builder = builder.row(vec![
            format!("{family}{enabled}"),
            config.num_datasets(family).to_string(),
            width,
            bounds,
            config.results_path(family).display().to_string(),
        ]);
    }
    builder.build().to_string()
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    if let Some(path) = &args.tester.config {
        log(level, LogLevel::Normal, &format!("Validating config: {}", path.display()));
    }

    let config = resolve_config(&args.tester).map_err(|e| format!("[{}] {e}", e.code()))?;
    config.validate().map_err(|e| format!("[{}] {e}", e.code()))?;
    for family in &config.families {
        config.family_under_test(*family).map_err(|e| format!("[{}] {e}", e.code()))?;
    }

    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Corridor: [{}, {}]\n  Samples per histogram: {}\n  Epsilon: {:.6}\n  Noise ratio: {}",
            config.ratio_min,
            config.ratio_max,
            config.num_samples_per_histogram,
            config.epsilon,
            config.noise_ratio
        ),
    );
    if args.detailed {
        log(level, LogLevel::Normal, &format_family_settings(&config));
    }
    Ok(())
}
