//! Shared infrastructure for the dp-stochastic harness.
//!
//! - Error handling with actionable diagnostics and stable error codes
//! - Output format selection and terminal table rendering

pub mod error;
pub mod output;

pub use error::{Result, StochasticError};
pub use output::{OutputFormat, Table, TableBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_has_actionable_message() {
        let err = StochasticError::config("num_samples_per_histogram", "must be greater than 0");
        let msg = err.to_string();
        assert!(msg.contains("num_samples_per_histogram"));
        assert!(msg.contains("no test was executed"));
    }

    #[test]
    fn test_table_builder_creates_valid_table() {
        let table = TableBuilder::new()
            .headers(vec!["Name", "Value"])
            .row(vec!["test", "123"])
            .build();

        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_output_format_parsing() {
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!(matches!("table".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!("invalid".parse::<OutputFormat>().is_err());
    }
}
