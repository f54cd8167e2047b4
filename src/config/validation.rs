//! Configuration validation system.

use super::types::HarnessConfig;

/// Upper bound on warm-up invocations accepted from configuration.
pub const MAX_WARMUP: u32 = 1_000_000;

/// A single validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// Error message.
    pub message: String,
    /// Severity level.
    pub severity: ValidationSeverity,
}

impl ValidationError {
    /// Create a new error.
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Create a new warning.
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// Severity of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Error - configuration is invalid.
    Error,
    /// Warning - results may be less useful.
    Warning,
}

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Check if the validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| e.severity == ValidationSeverity::Error)
    }

    /// Get all validation issues.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get only errors (not warnings).
    #[must_use]
    pub fn errors_only(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Get only warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Warning)
            .collect()
    }

}

/// Trait for configuration validators.
pub trait Validator: std::fmt::Debug + Send + Sync {
    /// Validate a configuration and return any errors.
    fn validate(&self, config: &HarnessConfig) -> ValidationResult;
}

/// Built-in validator for basic configuration checks.
#[derive(Debug, Default)]
pub struct BasicValidator;

impl BasicValidator {
    /// Create a new basic validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for BasicValidator {
    fn validate(&self, config: &HarnessConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.run.iterations == 0 {
            result.add_error(ValidationError::error(
                "run.iterations",
                "Iterations must be at least 1",
            ));
        } else if config.run.iterations == 1 {
            result.add_error(ValidationError::warning(
                "run.iterations",
                "A single iteration reports no error margin",
            ));
        }

        if config.run.warmup > MAX_WARMUP {
            result.add_error(ValidationError::error(
                "run.warmup",
                format!("Warm-up count cannot exceed {MAX_WARMUP}"),
            ));
        }

        if config.run.suites.iter().any(|s| s.trim().is_empty()) {
            result.add_error(ValidationError::error(
                "run.suites",
                "Suite names cannot be empty",
            ));
        }

        if config
            .report
            .output
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            result.add_error(ValidationError::error(
                "report.output",
                "Output path cannot be empty",
            ));
        }

        for (suite, params) in &config.params {
            for (name, values) in params {
                if values.is_empty() {
                    result.add_error(ValidationError::error(
                        format!("params.{suite}.{name}"),
                        format!("Parameter {name} of suite {suite} needs at least one value"),
                    ));
                }
            }
        }

        result
    }
}

/// Validator that checks suite names against the registered suites.
#[derive(Debug, Default)]
pub struct SuiteNameValidator {
    known: Vec<String>,
}

impl SuiteNameValidator {
    /// Create a validator accepting the given suite names.
    #[must_use]
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    fn is_registered(&self, name: &str) -> bool {
        self.known.iter().any(|k| k == name)
    }

    fn is_selectable(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("all") || self.is_registered(name)
    }
}

impl Validator for SuiteNameValidator {
    fn validate(&self, config: &HarnessConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let available = self.known.join(", ");

        for suite in &config.run.suites {
            if !self.is_selectable(suite) {
                result.add_error(ValidationError::error(
                    "run.suites",
                    format!("Unknown suite: {suite} (available: {available})"),
                ));
            }
        }

        // Parameter tables name one suite each; `all` is only a selector.
        for suite in config.params.keys() {
            if !self.is_registered(suite) {
                result.add_error(ValidationError::error(
                    format!("params.{suite}"),
                    format!("Unknown suite: {suite} (available: {available})"),
                ));
            }
        }

        result
    }
}
