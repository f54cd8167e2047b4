//! Top-level error type for the harness binary.

use crate::config::ConfigError;
use crate::perf::{MatrixError, RegistryError, ReportError, RunError};
use thiserror::Error;

/// Any error that ends a harness invocation.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A parameter override was malformed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Suite registration or selection failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The run could not start.
    #[error(transparent)]
    Run(#[from] RunError),

    /// The report could not be produced.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
