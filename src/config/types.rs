//! Configuration type definitions.

use crate::perf::{ConfidenceLevel, ParamOverride, ReportFormat, TimingConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure for a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Suite selection and timing.
    pub run: RunSection,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Report output.
    pub report: ReportSection,

    /// Parameter value overrides, keyed by suite then parameter name.
    pub params: BTreeMap<String, BTreeMap<String, Vec<u64>>>,
}

impl HarnessConfig {
    /// Timing settings for the engine.
    pub fn timing(&self) -> TimingConfig {
        TimingConfig::default()
            .with_warmup(self.run.warmup)
            .with_iterations(self.run.iterations)
            .with_confidence(self.run.confidence)
    }

    /// The `[params.<suite>]` tables as suite-scoped overrides.
    pub fn overrides(&self) -> Vec<ParamOverride> {
        self.params
            .iter()
            .flat_map(|(suite, params)| {
                params.iter().map(move |(name, values)| {
                    ParamOverride::new(Some(suite.as_str()), name, values.clone())
                })
            })
            .collect()
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunSection {
    /// Suites to run. Empty means all.
    pub suites: Vec<String>,

    /// Measured invocations per operation and configuration.
    pub iterations: u32,

    /// Discarded invocations before measurement.
    pub warmup: u32,

    /// Confidence level of the error margin.
    pub confidence: ConfidenceLevel,
}

impl Default for RunSection {
    fn default() -> Self {
        let timing = TimingConfig::default();
        Self {
            suites: Vec::new(),
            iterations: timing.iterations,
            warmup: timing.warmup,
            confidence: timing.confidence,
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ReportSection {
    /// Format of the exported report.
    pub format: ReportFormat,

    /// File the export is written to. Printed to stdout when unset.
    pub output: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Log format (json, pretty, compact).
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose).
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level (default).
    #[default]
    Warn,
    /// Error level (least verbose).
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable).
    Json,
    /// Pretty multi-line format.
    Pretty,
    /// Compact single-line format (default).
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert!(config.run.suites.is_empty());
        assert_eq!(config.run.iterations, 10);
        assert_eq!(config.run.warmup, 3);
        assert_eq!(config.run.confidence, ConfidenceLevel::P999);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.report.format, ReportFormat::Table);
        assert!(config.params.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [run]
            suites = ["strings"]
            iterations = 25
            warmup = 5
            confidence = "99"

            [logging]
            level = "debug"
            format = "json"

            [report]
            format = "csv"
            output = "out/report.csv"

            [params.strings]
            InputSize = [10, 100]

            [params.collections]
            N = [1000]
        "#;

        let config: HarnessConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.run.suites, vec!["strings"]);
        assert_eq!(config.run.iterations, 25);
        assert_eq!(config.run.confidence, ConfidenceLevel::P99);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.report.format, ReportFormat::Csv);
        assert_eq!(config.report.output, Some(PathBuf::from("out/report.csv")));

        let timing = config.timing();
        assert_eq!(timing.iterations, 25);
        assert_eq!(timing.warmup, 5);

        let overrides = config.overrides();
        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides[0],
            ParamOverride::new(Some("collections"), "N", vec![1000])
        );
        assert!(overrides[1].applies_to("strings"));
        assert!(!overrides[1].applies_to("collections"));
    }

    #[test]
    fn test_zero_iterations_clamped_in_timing() {
        let mut config = HarnessConfig::default();
        config.run.iterations = 0;
        assert_eq!(config.timing().iterations, 1);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
