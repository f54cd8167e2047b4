//! # Configuration System
//!
//! TOML-based configuration for benchmark runs: which suites to run, timing
//! settings, logging, report output and per-suite parameter overrides.
//! Command-line flags take precedence over file values.
//!
//! ## Example Configuration
//!
//! ```toml
//! [run]
//! suites = ["strings", "zipcodes"]
//! iterations = 20
//! warmup = 5
//! confidence = "99.9"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [report]
//! format = "markdown"
//! output = "results.md"
//!
//! [params.strings]
//! InputSize = [100, 1_000]
//! ```

mod error;
mod loader;
mod types;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
pub use types::{HarnessConfig, LogFormat, LogLevel, LoggingConfig, ReportSection, RunSection};
pub use validation::{
    BasicValidator, SuiteNameValidator, ValidationError, ValidationResult, ValidationSeverity,
    Validator, MAX_WARMUP,
};
