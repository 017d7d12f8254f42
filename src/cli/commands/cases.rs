//! Cases command implementation

use dp_stochastic_common::{OutputFormat, TableBuilder};

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{resolve_config, CasesArgs, TesterArgs};
use crate::tester::{AlgorithmFamily, TestCase};

/// One line per case: name, edit, dataset sizes and ratio ceiling
pub fn format_cases(family: AlgorithmFamily, cases: &[TestCase]) -> String {
    let mut builder = TableBuilder::new()
        .title(format!("{family} test cases"))
        .headers(vec!["#", "Name", "Edit", "Base size", "Neighbor size", "Expected bound"]);
    for (index, case) in cases.iter().enumerate() {
        let pair = &case.neighbor_pair;
        builder = builder.row(vec![
            index.to_string(),
            case.name.clone(),
            pair.edit().to_string(),
            pair.base().len().to_string(),
            pair.neighbor().len().to_string(),
            format!("{:.4}", case.expected_ratio_bound),
        ]);
    }
    builder.build().to_string()
}

pub fn run_cases(args: CasesArgs, level: LogLevel) -> Result<(), String> {
    let family: AlgorithmFamily = args.family.parse().map_err(|e: dp_stochastic_common::StochasticError| {
        format!("[{}] {e}", e.code())
    })?;
    let tester_args = TesterArgs { config: args.config.clone(), ..TesterArgs::default() };
    let config = resolve_config(&tester_args).map_err(|e| format!("[{}] {e}", e.code()))?;
    config.validate().map_err(|e| format!("[{}] {e}", e.code()))?;

    let under_test = config.family_under_test(family).map_err(|e| format!("[{}] {e}", e.code()))?;
    let num_datasets = args.num_datasets.unwrap_or_else(|| config.num_datasets(family));
    let cases = under_test
        .generate_sequence(num_datasets)
        .map_err(|e| format!("[{}] {e}", e.code()))?;

    match args.format {
        OutputFormat::Json => {
            let listing: Vec<serde_json::Value> = cases
                .iter()
                .map(|case| {
                    serde_json::json!({
                        "name": case.name,
                        "edit": case.neighbor_pair.edit(),
                        "base_size": case.neighbor_pair.base().len(),
                        "neighbor_size": case.neighbor_pair.neighbor().len(),
                        "expected_ratio_bound": case.expected_ratio_bound,
                    })
                })
                .collect();
            if let Ok(json_str) = serde_json::to_string_pretty(&listing) {
                println!("{json_str}");
            }
        }
        OutputFormat::Text => log(level, LogLevel::Normal, &format_cases(family, &cases)),
    }
    Ok(())
}
