//! Operation registry.
//!
//! Operations are registered explicitly into suites at process start. Each
//! operation is tagged read-only or mutating by the constructor used to
//! create it, which tells the engine whether it needs a per-invocation clone
//! of the fixture.

use super::benchmark::{invoke, Engine, Invocation, Observe, OpResult};
use super::fixture::Fixture;
use super::matrix::{BenchmarkConfiguration, ParamSpace};
use super::report::{CellOutcome, ReportRow};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A suite with this name is already registered.
    #[error("suite '{0}' is already registered")]
    DuplicateSuite(String),

    /// A suite declares two operations with the same name.
    #[error("suite '{suite}' declares operation '{operation}' twice")]
    DuplicateOperation {
        /// Suite name.
        suite: String,
        /// Repeated operation name.
        operation: String,
    },

    /// No suite with this name exists.
    #[error("unknown suite '{name}' (available: {available})")]
    UnknownSuite {
        /// Requested name.
        name: String,
        /// Comma separated registered names.
        available: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Whether an operation may share the fixture across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Only reads the fixture; the shared instance is passed directly.
    ReadOnly,
    /// Changes its input; every invocation works on a fresh clone.
    Mutating,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Mutating => write!(f, "mutating"),
        }
    }
}

type ReadOnlyBody<F> = Box<dyn Fn(&F) -> OpResult<Invocation>>;
type MutatingBody<F> = Box<dyn Fn(&mut F) -> OpResult<Invocation>>;

enum Body<F> {
    ReadOnly(ReadOnlyBody<F>),
    Mutating(MutatingBody<F>),
}

/// A named, measurable unit of work over a fixture of type `F`.
pub struct Operation<F> {
    name: String,
    baseline: bool,
    body: Body<F>,
}

impl<F: Fixture> Operation<F> {
    /// Register an operation that only reads the fixture.
    pub fn read_only<R, B>(name: impl Into<String>, body: B) -> Self
    where
        R: Observe,
        B: Fn(&F) -> OpResult<R> + 'static,
    {
        Self {
            name: name.into(),
            baseline: false,
            body: Body::ReadOnly(Box::new(move |fixture: &F| invoke(|| body(fixture)))),
        }
    }

    /// Register an operation that changes its input.
    pub fn mutating<R, B>(name: impl Into<String>, body: B) -> Self
    where
        R: Observe,
        B: Fn(&mut F) -> OpResult<R> + 'static,
    {
        Self {
            name: name.into(),
            baseline: false,
            body: Body::Mutating(Box::new(move |fixture: &mut F| invoke(|| body(fixture)))),
        }
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation class.
    pub fn kind(&self) -> OperationKind {
        match self.body {
            Body::ReadOnly(_) => OperationKind::ReadOnly,
            Body::Mutating(_) => OperationKind::Mutating,
        }
    }

    /// Whether other operations of the suite are compared against this one.
    pub fn is_baseline(&self) -> bool {
        self.baseline
    }

    /// Run one timed invocation. Mutating operations work on a clone made
    /// before the timer starts and dropped after it stops.
    ///
    /// # Errors
    ///
    /// Propagates the body's error.
    pub fn invoke(&self, fixture: &F) -> OpResult<Invocation> {
        match &self.body {
            Body::ReadOnly(body) => body(fixture),
            Body::Mutating(body) => {
                let mut working = fixture.clone();
                body(&mut working)
            }
        }
    }
}

impl<F> fmt::Debug for Operation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            Body::ReadOnly(_) => OperationKind::ReadOnly,
            Body::Mutating(_) => OperationKind::Mutating,
        };
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("baseline", &self.baseline)
            .finish()
    }
}

/// Listing entry for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    /// Operation name.
    pub name: String,
    /// Operation class.
    pub kind: OperationKind,
    /// Baseline marker.
    pub baseline: bool,
}

/// Type-erased view of a suite, used by the runner and the registry.
pub trait SuiteRunner {
    /// Suite name.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Declared parameters with their default values.
    fn parameters(&self) -> &ParamSpace;

    /// Registered operations in registration order.
    fn operations(&self) -> Vec<OperationInfo>;

    /// Build the fixture for one configuration and measure every operation
    /// against it. Never fails as a whole: fixture errors produce skipped
    /// rows and operation errors produce failed rows.
    fn run_configuration(
        &self,
        configuration: &BenchmarkConfiguration,
        engine: &Engine,
    ) -> Vec<ReportRow>;
}

/// A group of operations sharing one fixture type.
pub struct Suite<F> {
    name: String,
    description: String,
    parameters: ParamSpace,
    operations: Vec<Operation<F>>,
}

impl<F: Fixture> Suite<F> {
    /// Create an empty suite.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParamSpace::new(),
            operations: Vec::new(),
        }
    }

    /// Declare a parameter and its default values.
    #[must_use]
    pub fn with_parameter(mut self, name: &str, values: impl IntoIterator<Item = u64>) -> Self {
        self.parameters = self.parameters.with_parameter(name, values);
        self
    }

    /// Add an operation.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation<F>) -> Self {
        self.operations.push(operation);
        self
    }

    /// Add a read-only operation.
    #[must_use]
    pub fn read_only<R, B>(self, name: &str, body: B) -> Self
    where
        R: Observe,
        B: Fn(&F) -> OpResult<R> + 'static,
    {
        self.with_operation(Operation::read_only(name, body))
    }

    /// Add a mutating operation.
    #[must_use]
    pub fn mutating<R, B>(self, name: &str, body: B) -> Self
    where
        R: Observe,
        B: Fn(&mut F) -> OpResult<R> + 'static,
    {
        self.with_operation(Operation::mutating(name, body))
    }

    /// Mark the named operation as the suite baseline.
    #[must_use]
    pub fn baseline(mut self, name: &str) -> Self {
        for operation in &mut self.operations {
            operation.baseline = operation.name == name;
        }
        self
    }

    /// Look up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&Operation<F>> {
        self.operations.iter().find(|op| op.name == name)
    }

    fn row(
        &self,
        operation: &Operation<F>,
        configuration: &BenchmarkConfiguration,
        outcome: CellOutcome,
    ) -> ReportRow {
        ReportRow {
            suite: self.name.clone(),
            operation: operation.name.clone(),
            kind: operation.kind(),
            baseline: operation.baseline,
            configuration: configuration.clone(),
            outcome,
        }
    }
}

impl<F> fmt::Debug for Suite<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("operations", &self.operations)
            .finish()
    }
}

impl<F: Fixture> SuiteRunner for Suite<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ParamSpace {
        &self.parameters
    }

    fn operations(&self) -> Vec<OperationInfo> {
        self.operations
            .iter()
            .map(|op| OperationInfo {
                name: op.name.clone(),
                kind: op.kind(),
                baseline: op.baseline,
            })
            .collect()
    }

    fn run_configuration(
        &self,
        configuration: &BenchmarkConfiguration,
        engine: &Engine,
    ) -> Vec<ReportRow> {
        let fixture = match F::build(configuration) {
            Ok(fixture) => fixture,
            Err(err) => {
                warn!(
                    suite = %self.name,
                    configuration = %configuration,
                    error = %err,
                    "Fixture construction failed, skipping configuration"
                );
                let reason = err.to_string();
                return self
                    .operations
                    .iter()
                    .map(|op| {
                        self.row(
                            op,
                            configuration,
                            CellOutcome::Skipped {
                                reason: reason.clone(),
                            },
                        )
                    })
                    .collect();
            }
        };
        debug!(suite = %self.name, configuration = %configuration, "Fixture ready");

        let rows = self
            .operations
            .iter()
            .map(|op| {
                let outcome = match engine.run(op, &fixture) {
                    Ok(result) => {
                        info!(
                            suite = %self.name,
                            operation = %op.name,
                            configuration = %configuration,
                            mean_ns = result.stats.mean_ns,
                            "Operation measured"
                        );
                        CellOutcome::Measured(result)
                    }
                    Err(err) => {
                        warn!(
                            suite = %self.name,
                            operation = %op.name,
                            configuration = %configuration,
                            error = %err,
                            "Operation failed"
                        );
                        CellOutcome::Failed {
                            reason: err.to_string(),
                        }
                    }
                };
                self.row(op, configuration, outcome)
            })
            .collect();

        drop(fixture);
        rows
    }
}

/// All suites known to the harness, in registration order.
#[derive(Default)]
pub struct Registry {
    suites: Vec<Box<dyn SuiteRunner>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite.
    ///
    /// # Errors
    ///
    /// Rejects duplicate suite names and suites with repeated operation names.
    pub fn register<S: SuiteRunner + 'static>(&mut self, suite: S) -> RegistryResult<()> {
        if self.get(suite.name()).is_some() {
            return Err(RegistryError::DuplicateSuite(suite.name().to_string()));
        }

        let operations = suite.operations();
        for (i, op) in operations.iter().enumerate() {
            if operations[..i].iter().any(|earlier| earlier.name == op.name) {
                return Err(RegistryError::DuplicateOperation {
                    suite: suite.name().to_string(),
                    operation: op.name.clone(),
                });
            }
        }

        self.suites.push(Box::new(suite));
        Ok(())
    }

    /// Look up a suite by name.
    pub fn get(&self, name: &str) -> Option<&dyn SuiteRunner> {
        self.suites
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
    }

    /// Registered suites in order.
    pub fn suites(&self) -> impl Iterator<Item = &dyn SuiteRunner> {
        self.suites.iter().map(|s| &**s)
    }

    /// Registered suite names in order.
    pub fn names(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name()).collect()
    }

    /// Number of suites.
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// True when no suite is registered.
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Resolve requested suite names. An empty request or `all` selects every
    /// suite in registration order; otherwise the requested order is kept and
    /// repeats are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSuite`] for names not registered.
    pub fn select(&self, names: &[String]) -> RegistryResult<Vec<&dyn SuiteRunner>> {
        if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            return Ok(self.suites().collect());
        }

        let mut selected: Vec<&dyn SuiteRunner> = Vec::with_capacity(names.len());
        for name in names {
            let suite = self.get(name).ok_or_else(|| RegistryError::UnknownSuite {
                name: name.clone(),
                available: self.names().join(", "),
            })?;
            if !selected.iter().any(|s| s.name() == suite.name()) {
                selected.push(suite);
            }
        }
        Ok(selected)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("suites", &self.names())
            .finish()
    }
}
