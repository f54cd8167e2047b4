//! Fixture construction.
//!
//! A fixture is the input data of one configuration. It is built once before
//! any timed invocation, shared by read-only operations and cloned for
//! mutating ones, then dropped when the configuration is done.

use super::matrix::BenchmarkConfiguration;
use thiserror::Error;

/// Errors raised while building a fixture. The affected configuration is
/// skipped; other configurations still run.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The configuration lacks a parameter the fixture needs.
    #[error("missing parameter '{name}'")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },

    /// A parameter value cannot be used by this fixture.
    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Offending value.
        value: u64,
        /// Why it was rejected.
        reason: String,
    },

    /// The scenario pattern failed to compile.
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for fixture construction.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Input data for one configuration of a suite.
///
/// `build` must be deterministic: the same configuration yields equal data
/// on every call.
pub trait Fixture: Clone + 'static {
    /// Build the fixture for a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] when the configuration cannot be satisfied.
    fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self>;
}

/// Read a size parameter, checking it fits in `usize` and stays under `max`.
///
/// # Errors
///
/// Returns [`FixtureError::MissingParameter`] or [`FixtureError::InvalidValue`].
pub fn size_param(
    configuration: &BenchmarkConfiguration,
    name: &str,
    max: usize,
) -> FixtureResult<usize> {
    let value = configuration
        .get(name)
        .ok_or_else(|| FixtureError::MissingParameter {
            name: name.to_string(),
        })?;

    let size = usize::try_from(value).map_err(|_| FixtureError::InvalidValue {
        name: name.to_string(),
        value,
        reason: "does not fit in usize".to_string(),
    })?;

    if size > max {
        return Err(FixtureError::InvalidValue {
            name: name.to_string(),
            value,
            reason: format!("exceeds the supported maximum of {max}"),
        });
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_param() {
        let config = BenchmarkConfiguration::new([("N", 42u64)]);
        assert_eq!(size_param(&config, "N", 100).unwrap(), 42);
    }

    #[test]
    fn test_size_param_missing() {
        let config = BenchmarkConfiguration::new([("N", 42u64)]);
        let err = size_param(&config, "Count", 100).unwrap_err();
        assert!(matches!(err, FixtureError::MissingParameter { .. }));
    }

    #[test]
    fn test_size_param_too_large() {
        let config = BenchmarkConfiguration::new([("N", 101u64)]);
        let err = size_param(&config, "N", 100).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidValue { value: 101, .. }));
        assert!(err.to_string().contains("maximum of 100"));
    }
}
