//! # Measurement Core
//!
//! Everything needed to measure a set of operations across a parameter
//! matrix and report the results.
//!
//! ## Pieces
//!
//! - **Matrix**: declared parameters expanded into configurations
//! - **Fixture**: deterministic per-configuration input data
//! - **Registry**: suites of read-only and mutating operations
//! - **Engine**: warm-up, measured iterations, statistics and allocation
//! - **Report**: grouped tables and JSON/CSV/markdown export
//! - **Runner**: the sequential loop over suites and configurations
//!
//! ## Example
//!
//! ```rust
//! use perf_matrix::perf::{Registry, Runner, Suite, TimingConfig};
//! use perf_matrix::perf::{size_param, BenchmarkConfiguration, Fixture, FixtureResult};
//!
//! #[derive(Clone)]
//! struct Numbers(Vec<u64>);
//!
//! impl Fixture for Numbers {
//!     fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self> {
//!         let n = size_param(configuration, "N", 1_000)?;
//!         Ok(Self((0..n as u64).collect()))
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         Suite::<Numbers>::new("numbers", "sum a vector")
//!             .with_parameter("N", [10, 100])
//!             .read_only("sum", |f: &Numbers| Ok(f.0.iter().sum::<u64>())),
//!     )
//!     .unwrap();
//!
//! let timing = TimingConfig::default().with_warmup(1).with_iterations(3);
//! let report = Runner::new(&registry, timing).run(&[]).unwrap();
//! assert_eq!(report.rows().len(), 2);
//! ```

pub mod benchmark;
pub mod fixture;
pub mod matrix;
pub mod memory;
pub mod registry;
pub mod report;
pub mod runner;
pub mod stats;

pub use benchmark::{
    invoke, measure, Engine, Invocation, Observe, OpResult, OperationError, OperationResult,
    Outcome, TimingConfig,
};
pub use fixture::{size_param, Fixture, FixtureError, FixtureResult};
pub use matrix::{
    BenchmarkConfiguration, MatrixError, MatrixResult, ParamOverride, ParamSpace, Parameter,
};
pub use memory::{Allocator, CountingAllocator};
pub use registry::{
    Operation, OperationInfo, OperationKind, Registry, RegistryError, RegistryResult, Suite,
    SuiteRunner,
};
pub use report::{BenchReport, CellOutcome, ReportError, ReportFormat, ReportResult, ReportRow};
pub use runner::{RunError, RunResult, Runner, SuitePlan};
pub use stats::{ConfidenceLevel, SampleStats};
