#![allow(missing_docs, dead_code)]
//! Shared benchmark support: sizes and fixture construction.

use perf_matrix::perf::{BenchmarkConfiguration, Fixture};

/// Standard input sizes for criterion groups.
pub struct BenchSizes;

impl BenchSizes {
    /// Sizes for linear operations.
    pub const LINEAR: [u64; 3] = [100, 1_000, 10_000];
    /// Sizes for quadratic operations.
    pub const QUADRATIC: [u64; 3] = [10, 100, 1_000];
}

/// Build a fixture for a single-parameter configuration.
pub fn fixture<F: Fixture>(param: &str, value: u64) -> F {
    let configuration = BenchmarkConfiguration::new([(param, value)]);
    F::build(&configuration).expect("Failed to build benchmark fixture")
}
