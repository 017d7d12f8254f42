//! Output formatting: format selection and box-drawn terminal tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {s}. Use: text, json")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// A rendered-on-demand table with a header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    fn rule(widths: &[usize], left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", segments.join(&mid.to_string()))
    }

    fn line(widths: &[usize], cells: &[String]) -> String {
        let mut out = String::from("│");
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map_or("", String::as_str);
            out.push_str(&format!(" {cell:<width$} │"));
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        f.write_str(&Self::rule(&widths, '┌', '┬', '┐'))?;
        f.write_str(&Self::line(&widths, &self.headers))?;
        f.write_str(&Self::rule(&widths, '├', '┼', '┤'))?;
        for row in &self.rows {
            f.write_str(&Self::line(&widths, row))?;
        }
        f.write_str(&Self::rule(&widths, '└', '┴', '┘'))
    }
}

/// Builder for [`Table`].
#[derive(Debug, Default)]
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    /// Start an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a title printed above the table.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.table.title = Some(title.into());
        self
    }

    /// Set column headers.
    pub fn headers<S: Into<String>>(mut self, headers: Vec<S>) -> Self {
        self.table.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Append a row.
    pub fn row<S: Into<String>>(mut self, row: Vec<S>) -> Self {
        self.table.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Finish building.
    pub fn build(self) -> Table {
        self.table
    }
}
