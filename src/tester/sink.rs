//! Append-only result stream.

use std::io::Write;

use dp_stochastic_common::{Result, StochasticError};

use super::result::{RatioResult, CSV_HEADER};

/// Writes the header and one line per case; never reads back
#[derive(Debug)]
pub struct ResultSink<W: Write> {
    writer: W,
    rows_written: usize,
}

impl<W: Write> ResultSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows_written: 0 }
    }

    /// Emit the column header
    pub fn write_header(&mut self) -> Result<()> {
        writeln!(self.writer, "{CSV_HEADER}")
            .map_err(|e| StochasticError::sink("writing header", e))
    }

    /// Append one case
    pub fn write_row(&mut self, result: &RatioResult) -> Result<()> {
        writeln!(self.writer, "{}", result.to_csv_row()).map_err(|e| {
            StochasticError::sink(format!("writing row for {}", result.test_name), e)
        })?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows appended so far, header excluded
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| StochasticError::sink("flushing results", e))
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
