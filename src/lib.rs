//! # perf-matrix
//!
//! A microbenchmark harness that measures time and allocation of a fixed set
//! of data-structure and string operations across a matrix of parameters.
//!
//! ## Features
//!
//! - Cartesian parameter matrices with per-suite overrides
//! - Deterministic fixtures built once per configuration
//! - Read-only and mutating operations, the latter on a fresh clone per call
//! - Mean, standard deviation, median and Student-t error margins
//! - Allocation accounting through a counting global allocator
//! - Plain text, markdown, JSON and CSV reports
//!
//! ## Architecture
//!
//! [`perf`] holds the measurement core. [`scenarios`] registers the built-in
//! suites against it, and [`config`] loads run settings from TOML. The
//! `perf-matrix` binary ties them together behind a small CLI.

pub mod config;
pub mod error;
pub mod perf;
pub mod scenarios;

pub use error::{HarnessError, HarnessResult};
