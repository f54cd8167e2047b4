//! Sequential benchmark runner.
//!
//! Ties the pieces together: selects suites from the [`Registry`], applies
//! parameter overrides, expands each suite's matrix and measures every
//! configuration in order on the calling thread.

use super::benchmark::{Engine, TimingConfig};
use super::matrix::{BenchmarkConfiguration, MatrixError, ParamOverride, ParamSpace};
use super::registry::{Registry, RegistryError, SuiteRunner};
use super::report::{BenchReport, ReportRow};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a run before anything is measured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Suite selection failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A parameter override could not be applied.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Result type for runs.
pub type RunResult<T> = Result<T, RunError>;

/// The configurations one suite will be measured under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePlan {
    /// Suite name.
    pub suite: String,
    /// Parameter space after overrides.
    pub parameters: ParamSpace,
    /// Expanded configurations in execution order.
    pub configurations: Vec<BenchmarkConfiguration>,
}

/// Drives suites through the timing engine.
#[derive(Debug)]
pub struct Runner<'r> {
    registry: &'r Registry,
    engine: Engine,
    overrides: Vec<ParamOverride>,
    title: String,
}

impl<'r> Runner<'r> {
    /// Create a runner over a registry.
    pub fn new(registry: &'r Registry, timing: TimingConfig) -> Self {
        Self {
            registry,
            engine: Engine::new(timing),
            overrides: Vec::new(),
            title: "perf-matrix".to_string(),
        }
    }

    /// Replace parameter values for the suites the overrides target.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = ParamOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Set the report title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Timing settings in use.
    pub fn timing(&self) -> &TimingConfig {
        self.engine.config()
    }

    /// Resolve suites and expand their matrices without measuring anything.
    ///
    /// # Errors
    ///
    /// Fails on unknown suites, and on overrides that no selected suite
    /// declares. Overrides scoped to a registered suite that is not selected
    /// are ignored.
    pub fn plan(&self, suites: &[String]) -> RunResult<Vec<SuitePlan>> {
        let selected = self.registry.select(suites)?;

        for ov in &self.overrides {
            if let Some(target) = &ov.suite {
                if self.registry.get(target).is_none() {
                    return Err(RegistryError::UnknownSuite {
                        name: target.clone(),
                        available: self.registry.names().join(", "),
                    }
                    .into());
                }
                if !selected.iter().any(|s| s.name() == target) {
                    debug!(
                        suite = %target,
                        parameter = %ov.name,
                        "Suite not selected, ignoring override"
                    );
                    continue;
                }
            }

            let matched = selected
                .iter()
                .any(|s| ov.applies_to(s.name()) && s.parameters().declares(&ov.name));
            if !matched {
                let declared = selected
                    .iter()
                    .filter(|s| ov.applies_to(s.name()))
                    .flat_map(|s| s.parameters().parameters().iter().map(|p| p.name.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let name = match &ov.suite {
                    Some(suite) => format!("{suite}.{}", ov.name),
                    None => ov.name.clone(),
                };
                return Err(MatrixError::UnknownParameter { name, declared }.into());
            }
        }

        selected
            .into_iter()
            .map(|suite| {
                let mut parameters = suite.parameters().clone();
                for ov in self.overrides.iter().filter(|o| o.applies_to(suite.name())) {
                    if parameters.declares(&ov.name) {
                        parameters.override_values(&ov.name, &ov.values)?;
                    }
                }
                Ok(SuitePlan {
                    suite: suite.name().to_string(),
                    configurations: parameters.expand(),
                    parameters,
                })
            })
            .collect()
    }

    /// Measure the selected suites and collect every row.
    ///
    /// Fixture and operation failures are recorded in the report and do not
    /// stop the run.
    ///
    /// # Errors
    ///
    /// Same as [`plan`](Self::plan); nothing is measured in that case.
    pub fn run(&self, suites: &[String]) -> RunResult<BenchReport> {
        let plans = self.plan(suites)?;
        let mut report = BenchReport::new(&self.title, *self.engine.config());

        for plan in &plans {
            let Some(suite) = self.registry.get(&plan.suite) else {
                continue;
            };
            report.extend(self.run_suite(suite, plan));
        }

        let failures = report.failures();
        if failures > 0 {
            warn!(failures, "Run finished with failed or skipped cells");
        }
        info!(rows = report.rows().len(), "Run complete");
        Ok(report)
    }

    fn run_suite(&self, suite: &dyn SuiteRunner, plan: &SuitePlan) -> Vec<ReportRow> {
        info!(
            suite = suite.name(),
            configurations = plan.configurations.len(),
            operations = suite.operations().len(),
            "Running suite"
        );
        if plan.configurations.is_empty() {
            warn!(suite = suite.name(), "Parameter matrix is empty, nothing to run");
        }

        let mut rows = Vec::new();
        for configuration in &plan.configurations {
            let start = Instant::now();
            rows.extend(suite.run_configuration(configuration, &self.engine));
            debug!(
                suite = suite.name(),
                %configuration,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Configuration done"
            );
        }
        rows
    }
}
