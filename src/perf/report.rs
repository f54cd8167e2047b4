//! Benchmark reporting.
//!
//! Turns the collected rows into a summary table per suite (one line per
//! configuration, one column per operation), a detailed long-form table, and
//! machine-readable JSON or CSV. Row, column and suite order always follow
//! the order in which rows were generated.

use super::benchmark::{OperationResult, TimingConfig};
use super::matrix::BenchmarkConfiguration;
use super::registry::OperationKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Reporting errors. Collected rows stay in memory when these occur.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing the report to a file failed.
    #[error("failed to write report to '{path}': {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to a stream failed.
    #[error("failed to emit report: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for reporting.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result of one (operation, configuration) cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    /// Measurement completed.
    Measured(OperationResult),
    /// The operation returned an error during measurement.
    Failed {
        /// Error message.
        reason: String,
    },
    /// The fixture for this configuration could not be built.
    Skipped {
        /// Error message.
        reason: String,
    },
}

impl CellOutcome {
    /// The measurement, if there is one.
    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            Self::Measured(result) => Some(result),
            _ => None,
        }
    }

    fn status(&self) -> &'static str {
        match self {
            Self::Measured(_) => "measured",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    fn reason(&self) -> &str {
        match self {
            Self::Measured(_) => "",
            Self::Failed { reason } | Self::Skipped { reason } => reason,
        }
    }
}

/// The externally visible unit: one operation under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Suite name.
    pub suite: String,
    /// Operation name.
    pub operation: String,
    /// Operation class.
    pub kind: OperationKind,
    /// Whether this operation is the suite baseline.
    pub baseline: bool,
    /// Configuration the operation ran under.
    pub configuration: BenchmarkConfiguration,
    /// What happened.
    #[serde(flatten)]
    pub outcome: CellOutcome,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned plain-text tables.
    #[default]
    Table,
    /// GitHub flavoured markdown tables.
    Markdown,
    /// Pretty printed JSON.
    Json,
    /// One CSV line per row.
    Csv,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown report format '{other}' (expected table, markdown, json or csv)"
            )),
        }
    }
}

/// Accumulates rows and renders reports.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Report title.
    pub title: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    /// Timing settings the rows were measured with.
    pub timing: TimingConfig,
    /// Whether allocation was measurable in this process.
    pub allocation_measured: bool,
    /// Rows in generation order.
    pub rows: Vec<ReportRow>,
}

impl BenchReport {
    /// Create an empty report.
    pub fn new(title: &str, timing: TimingConfig) -> Self {
        Self {
            title: title.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            timing,
            allocation_measured: super::memory::is_installed(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn add(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Append rows.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = ReportRow>) {
        self.rows.extend(rows);
    }

    /// Rows in generation order.
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Number of cells that failed or were skipped.
    pub fn failures(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome.result().is_none())
            .count()
    }

    /// Render in the requested format.
    ///
    /// # Errors
    ///
    /// Only JSON rendering can fail.
    pub fn render(&self, format: ReportFormat) -> ReportResult<String> {
        match format {
            ReportFormat::Table => Ok(self.summary()),
            ReportFormat::Markdown => Ok(self.markdown()),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Csv => Ok(self.to_csv()),
        }
    }

    /// Plain-text report: per suite a summary grid and the detailed table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} ===", self.title);
        let _ = writeln!(
            out,
            "{}  warmup={} iterations={} confidence={}",
            self.timestamp, self.timing.warmup, self.timing.iterations, self.timing.confidence
        );
        out.push('\n');

        for suite in self.suites() {
            let _ = writeln!(out, "── {suite} ──");
            out.push_str(&self.grid(suite).render_plain());
            out.push('\n');
            out.push_str(&self.detail(suite).render_plain());
            out.push('\n');
        }
        out
    }

    /// GitHub markdown report.
    pub fn markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(
            out,
            "Generated {} with warmup={}, iterations={}, confidence={}.\n",
            self.timestamp, self.timing.warmup, self.timing.iterations, self.timing.confidence
        );

        for suite in self.suites() {
            let _ = writeln!(out, "## {suite}\n");
            out.push_str(&self.grid(suite).render_markdown());
            out.push('\n');
            out.push_str(&self.detail(suite).render_markdown());
            out.push('\n');
        }
        out
    }

    /// Serialize the report to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One CSV line per row, with a header.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "suite,operation,kind,configuration,status,samples,mean_ns,stddev_ns,error_ns,\
             min_ns,max_ns,median_ns,allocated_bytes,output_len,reason\n",
        );

        for row in &self.rows {
            let stats = row.outcome.result().map(|r| &r.stats);
            let number = |value: Option<f64>| value.map(|v| format!("{v:.1}")).unwrap_or_default();
            let fields = [
                csv_field(&row.suite),
                csv_field(&row.operation),
                row.kind.to_string(),
                csv_field(&row.configuration.to_string()),
                row.outcome.status().to_string(),
                stats.map(|s| s.count.to_string()).unwrap_or_default(),
                number(stats.map(|s| s.mean_ns)),
                number(stats.map(|s| s.std_dev_ns)),
                number(stats.map(|s| s.error_ns)),
                number(stats.map(|s| s.min_ns)),
                number(stats.map(|s| s.max_ns)),
                number(stats.map(|s| s.median_ns)),
                row.outcome
                    .result()
                    .and_then(|r| r.allocated_bytes)
                    .map(|b| b.to_string())
                    .unwrap_or_default(),
                row.outcome
                    .result()
                    .map(|r| r.output_len.to_string())
                    .unwrap_or_default(),
                csv_field(row.outcome.reason()),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the rendered report to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Write`] when the file cannot be written.
    pub fn write_to(&self, path: &Path, format: ReportFormat) -> ReportResult<()> {
        let content = self.render(format)?;
        std::fs::write(path, content).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the rendered report to a stream.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] when the stream rejects the write.
    pub fn emit<W: Write>(&self, mut writer: W, format: ReportFormat) -> ReportResult<()> {
        let content = self.render(format)?;
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn suites(&self) -> Vec<&str> {
        ordered_unique(self.rows.iter().map(|r| r.suite.as_str()))
    }

    fn suite_rows<'a>(&'a self, suite: &'a str) -> impl Iterator<Item = &'a ReportRow> + 'a {
        self.rows.iter().filter(move |r| r.suite == suite)
    }

    fn baseline_mean(&self, suite: &str, configuration: &BenchmarkConfiguration) -> Option<f64> {
        self.suite_rows(suite)
            .find(|r| r.baseline && &r.configuration == configuration)
            .and_then(|r| r.outcome.result())
            .map(|r| r.stats.mean_ns)
    }

    /// Configurations as rows, operations as columns.
    fn grid(&self, suite: &str) -> TextTable {
        let operations = ordered_unique(self.suite_rows(suite).map(|r| r.operation.as_str()));
        let configurations = ordered_unique(self.suite_rows(suite).map(|r| &r.configuration));

        let mut headers = vec!["Params".to_string()];
        headers.extend(operations.iter().map(|op| op.to_string()));
        let mut table = TextTable::new(headers);

        for configuration in configurations {
            let mut cells = vec![configuration.to_string()];
            for operation in &operations {
                let cell = self
                    .suite_rows(suite)
                    .find(|r| &r.configuration == configuration && r.operation == *operation)
                    .map(|r| match &r.outcome {
                        CellOutcome::Measured(result) => format!(
                            "{} ± {}",
                            format_nanos(result.stats.mean_ns),
                            format_nanos(result.stats.error_ns)
                        ),
                        CellOutcome::Failed { .. } => "FAILED".to_string(),
                        CellOutcome::Skipped { .. } => "SKIPPED".to_string(),
                    })
                    .unwrap_or_else(|| "-".to_string());
                cells.push(cell);
            }
            table.push(cells);
        }
        table
    }

    /// Long form: one line per row.
    fn detail(&self, suite: &str) -> TextTable {
        let mut table = TextTable::new(
            [
                "Operation",
                "Params",
                "Mean",
                "Error",
                "StdDev",
                "Median",
                "Ratio",
                "Allocated",
                "Output",
            ]
            .map(String::from)
            .to_vec(),
        );

        for row in self.suite_rows(suite) {
            let name = if row.baseline {
                format!("{} (baseline)", row.operation)
            } else {
                row.operation.clone()
            };
            let cells = match &row.outcome {
                CellOutcome::Measured(result) => {
                    let ratio = self
                        .baseline_mean(suite, &row.configuration)
                        .filter(|base| *base > 0.0)
                        .map(|base| format!("{:.2}", result.stats.mean_ns / base))
                        .unwrap_or_else(|| "-".to_string());
                    vec![
                        name,
                        row.configuration.to_string(),
                        format_nanos(result.stats.mean_ns),
                        format_nanos(result.stats.error_ns),
                        format_nanos(result.stats.std_dev_ns),
                        format_nanos(result.stats.median_ns),
                        ratio,
                        format_bytes(result.allocated_bytes),
                        result.output_len.to_string(),
                    ]
                }
                other => {
                    let mut cells = vec![
                        name,
                        row.configuration.to_string(),
                        format!("{}: {}", other.status().to_uppercase(), other.reason()),
                    ];
                    cells.resize(9, "-".to_string());
                    cells
                }
            };
            table.push(cells);
        }
        table
    }
}

fn ordered_unique<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Human readable duration from nanoseconds.
pub fn format_nanos(nanos: f64) -> String {
    if nanos < 1_000.0 {
        format!("{nanos:.1} ns")
    } else if nanos < 1_000_000.0 {
        format!("{:.2} μs", nanos / 1_000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.2} ms", nanos / 1_000_000.0)
    } else {
        format!("{:.2} s", nanos / 1_000_000_000.0)
    }
}

/// Human readable byte count; `n/a` when allocation was not measured.
pub fn format_bytes(bytes: Option<u64>) -> String {
    match bytes {
        None => "n/a".to_string(),
        Some(b) if b < 1024 => format!("{b} B"),
        Some(b) if b < 1024 * 1024 => format!("{:.2} KB", b as f64 / 1024.0),
        Some(b) if b < 1024 * 1024 * 1024 => format!("{:.2} MB", b as f64 / (1024.0 * 1024.0)),
        Some(b) => format!("{:.2} GB", b as f64 / (1024.0 * 1024.0 * 1024.0)),
    }
}

#[derive(Debug)]
struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn render_plain(&self) -> String {
        let widths = self.widths();
        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i == 0 {
                        format!("{cell:<w$}")
                    } else {
                        format!("{cell:>w$}")
                    }
                })
                .collect();
            format!("  {}\n", padded.join("  "))
        };

        let mut out = line(&self.headers);
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let _ = writeln!(out, "  {}", "─".repeat(total));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out
    }

    fn render_markdown(&self) -> String {
        let escape = |cell: &String| cell.replace('|', "\\|");
        let mut out = format!(
            "| {} |\n",
            self.headers.iter().map(escape).collect::<Vec<_>>().join(" | ")
        );
        let separators: Vec<&str> = (0..self.headers.len())
            .map(|i| if i == 0 { "---" } else { "---:" })
            .collect();
        let _ = writeln!(out, "| {} |", separators.join(" | "));
        for row in &self.rows {
            let _ = writeln!(
                out,
                "| {} |",
                row.iter().map(escape).collect::<Vec<_>>().join(" | ")
            );
        }
        out
    }
}
