//! CLI command definitions using clap.

use clap::{Args, Parser, Subcommand};
use perf_matrix::config::{HarnessConfig, LogLevel};
use perf_matrix::perf::{ConfidenceLevel, ParamOverride, ReportFormat};
use std::path::PathBuf;

/// perf-matrix - parameterised microbenchmarks for collections and strings
#[derive(Parser, Debug)]
#[command(name = "perf-matrix")]
#[command(version)]
#[command(about = "Measure time and allocation of data-structure and string operations")]
#[command(
    long_about = "perf-matrix runs each registered operation across a matrix of parameter values, \
                  reports mean, error margin and allocation per configuration, and exports the \
                  results as a table, markdown, JSON or CSV."
)]
pub struct Cli {
    /// Configuration file (defaults to ./perf-matrix.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level; takes precedence over RUST_LOG and the config file
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List suites, their parameters and operations
    List,

    /// Run suites and report the results
    Run(RunArgs),

    /// Write a configuration file with default values
    Init {
        /// Destination path
        #[arg(default_value = perf_matrix::config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
}

/// Options of the `run` subcommand. Each one overrides the config file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Suites to run (`all` or none selects every suite)
    pub suites: Vec<String>,

    /// Measured invocations per operation and configuration
    #[arg(short, long)]
    pub iterations: Option<u32>,

    /// Discarded invocations before measuring
    #[arg(short, long)]
    pub warmup: Option<u32>,

    /// Replace parameter values, e.g. `N=10,1000` or `strings.InputSize=100`
    #[arg(short, long = "param", value_name = "[SUITE.]NAME=V1,V2")]
    pub params: Vec<ParamOverride>,

    /// Confidence level of the error margin (95, 99, 99.9)
    #[arg(long)]
    pub confidence: Option<ConfidenceLevel>,

    /// Report format (table, markdown, json, csv)
    #[arg(short, long)]
    pub format: Option<ReportFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Apply the flags that were given on top of file configuration.
    pub fn apply(&self, config: &mut HarnessConfig) {
        if !self.suites.is_empty() {
            config.run.suites = self.suites.clone();
        }
        if let Some(iterations) = self.iterations {
            config.run.iterations = iterations;
        }
        if let Some(warmup) = self.warmup {
            config.run.warmup = warmup;
        }
        if let Some(confidence) = self.confidence {
            config.run.confidence = confidence;
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
        if let Some(output) = &self.output {
            config.report.output = Some(output.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "perf-matrix",
            "run",
            "strings",
            "zipcodes",
            "--iterations",
            "5",
            "--param",
            "strings.InputSize=10,1_000",
            "-p",
            "Count=100",
            "--confidence",
            "99",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.suites, vec!["strings", "zipcodes"]);
        assert_eq!(args.params.len(), 2);
        assert_eq!(args.params[0].values, vec![10, 1_000]);
        assert_eq!(args.params[1].suite, None);

        let mut config = HarnessConfig::default();
        args.apply(&mut config);
        assert_eq!(config.run.iterations, 5);
        assert_eq!(config.run.warmup, 3);
        assert_eq!(config.run.confidence, ConfidenceLevel::P99);
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_rejects_bad_override() {
        assert!(Cli::try_parse_from(["perf-matrix", "run", "--param", "N"]).is_err());
        assert!(Cli::try_parse_from(["perf-matrix", "run", "--confidence", "90"]).is_err());
    }

    #[test]
    fn test_flags_absent_keep_file_values() {
        let mut config = HarnessConfig::default();
        config.run.suites = vec!["strings".to_string()];
        config.run.iterations = 30;

        RunArgs::default().apply(&mut config);
        assert_eq!(config.run.suites, vec!["strings"]);
        assert_eq!(config.run.iterations, 30);
    }
}
