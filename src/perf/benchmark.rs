//! Timing engine.
//!
//! Runs one registered operation against one fixture: discarded warm-up
//! invocations first, then the measured ones. Every invocation is timed on
//! its own with [`Instant`], its allocation is tracked per thread when the
//! counting allocator is installed, and its result is consumed into a
//! checksum so the optimizer cannot remove the work.

use super::fixture::Fixture;
use super::memory;
use super::registry::Operation;
use super::stats::{ConfidenceLevel, SampleStats};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised by an operation while it is being measured.
///
/// The measurement of that operation for the current configuration stops and
/// is reported as failed. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// A lock guarding the container under test was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// The operation found the fixture in a state it cannot work with.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Statistics could not be computed from the samples.
    #[error("no usable samples collected")]
    NoSamples,
}

/// Result type returned by operation bodies.
pub type OpResult<T> = Result<T, OperationError>;

/// Reduced form of an operation's return value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Logical size of the result (items, bytes, matches).
    pub len: usize,
    /// Cheap value-dependent fingerprint.
    pub digest: u64,
}

impl Outcome {
    /// Create an outcome.
    pub const fn new(len: usize, digest: u64) -> Self {
        Self { len, digest }
    }
}

/// Values an operation can return. Reduction happens after the timer stops.
pub trait Observe {
    /// Reduce the value to an [`Outcome`].
    fn observe(&self) -> Outcome;
}

impl Observe for usize {
    fn observe(&self) -> Outcome {
        Outcome::new(*self, *self as u64)
    }
}

impl Observe for u64 {
    fn observe(&self) -> Outcome {
        Outcome::new(usize::try_from(*self).unwrap_or(usize::MAX), *self)
    }
}

impl Observe for str {
    fn observe(&self) -> Outcome {
        let bytes = self.as_bytes();
        let first = bytes.first().copied().unwrap_or(0) as u64;
        let last = bytes.last().copied().unwrap_or(0) as u64;
        Outcome::new(bytes.len(), (bytes.len() as u64) ^ (first << 8) ^ (last << 16))
    }
}

impl Observe for String {
    fn observe(&self) -> Outcome {
        self.as_str().observe()
    }
}

impl<T: Observe> Observe for Vec<T> {
    fn observe(&self) -> Outcome {
        let first = self.first().map_or(0, |v| v.observe().digest);
        let last = self.last().map_or(0, |v| v.observe().digest);
        Outcome::new(
            self.len(),
            (self.len() as u64) ^ first.rotate_left(17) ^ last.rotate_left(31),
        )
    }
}

/// Warm-up and iteration counts for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Discarded invocations before measurement.
    pub warmup: u32,
    /// Measured invocations. Always at least one.
    pub iterations: u32,
    /// Confidence level of the reported error margin.
    pub confidence: ConfidenceLevel,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            warmup: 3,
            iterations: 10,
            confidence: ConfidenceLevel::default(),
        }
    }
}

impl TimingConfig {
    /// Set the warm-up count.
    #[must_use]
    pub fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the measured iteration count (clamped to at least one).
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Set the confidence level.
    #[must_use]
    pub fn with_confidence(mut self, confidence: ConfidenceLevel) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Measurement of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Wall-clock time of the body.
    pub elapsed: Duration,
    /// Bytes allocated by the body, if measurable.
    pub allocated: Option<u64>,
    /// Reduced return value.
    pub outcome: Outcome,
}

/// Measure wall-clock time for a synchronous operation.
pub fn measure<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    (result, elapsed)
}

/// Time one call of `body` and reduce its result.
///
/// Only the call itself sits inside the timed region; reducing and dropping
/// the result happen afterwards.
///
/// # Errors
///
/// Propagates the body's [`OperationError`].
pub fn invoke<R, B>(body: B) -> OpResult<Invocation>
where
    R: Observe,
    B: FnOnce() -> OpResult<R>,
{
    let ((result, elapsed), allocated) = memory::track(|| measure(body));

    let value = black_box(result?);
    let outcome = value.observe();
    drop(value);

    Ok(Invocation {
        elapsed,
        allocated,
        outcome,
    })
}

/// Aggregate of one operation under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    /// Timing statistics.
    pub stats: SampleStats,
    /// Mean bytes allocated per invocation; `None` when unmeasured.
    pub allocated_bytes: Option<u64>,
    /// Logical size of the last result.
    pub output_len: usize,
    /// Fold of every measured result's digest.
    pub checksum: u64,
}

impl OperationResult {
    /// Number of measured samples.
    pub fn samples(&self) -> usize {
        self.stats.count
    }

    /// Mean duration.
    pub fn mean(&self) -> Duration {
        self.stats.mean()
    }
}

/// Timing engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: TimingConfig,
}

impl Engine {
    /// Create an engine.
    pub fn new(config: TimingConfig) -> Self {
        Self {
            config: config.with_iterations(config.iterations),
        }
    }

    /// Timing configuration in use.
    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Measure one operation against a fixture.
    ///
    /// Mutating operations get a fresh clone of the fixture for every
    /// invocation, warm-up included, so the shared fixture never changes.
    ///
    /// # Errors
    ///
    /// Returns the first [`OperationError`] raised by any invocation.
    pub fn run<F: Fixture>(&self, operation: &Operation<F>, fixture: &F) -> OpResult<OperationResult> {
        for _ in 0..self.config.warmup {
            black_box(operation.invoke(fixture)?);
        }

        let iterations = self.config.iterations as usize;
        let mut samples = Vec::with_capacity(iterations);
        let mut allocated_total = Some(0u64);
        let mut checksum = 0u64;
        let mut output_len = 0;

        for iteration in 0..iterations {
            let invocation = operation.invoke(fixture)?;
            trace!(
                operation = operation.name(),
                iteration,
                elapsed_ns = invocation.elapsed.as_nanos() as u64,
                "Sample recorded"
            );

            samples.push(invocation.elapsed);
            allocated_total = allocated_total
                .zip(invocation.allocated)
                .map(|(total, bytes)| total.saturating_add(bytes));
            checksum = checksum.rotate_left(5) ^ invocation.outcome.digest;
            output_len = invocation.outcome.len;
        }

        let stats = SampleStats::from_durations(&samples, self.config.confidence)
            .ok_or(OperationError::NoSamples)?;
        debug!(
            operation = operation.name(),
            samples = stats.count,
            mean_ns = stats.mean_ns,
            "Measurement complete"
        );

        Ok(OperationResult {
            stats,
            allocated_bytes: allocated_total.map(|total| total / iterations as u64),
            output_len,
            checksum: black_box(checksum),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::fixture::FixtureResult;
    use crate::perf::matrix::BenchmarkConfiguration;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Numbers(Vec<u64>);

    impl Fixture for Numbers {
        fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self> {
            let n = configuration.get("N").unwrap_or(0);
            Ok(Self((0..n).collect()))
        }
    }

    fn fixture(n: u64) -> Numbers {
        Numbers::build(&BenchmarkConfiguration::new([("N", n)])).unwrap()
    }

    #[test]
    fn test_timing_config_default() {
        let config = TimingConfig::default();
        assert_eq!(config.warmup, 3);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.confidence, ConfidenceLevel::P999);
    }

    #[test]
    fn test_timing_config_builder() {
        let config = TimingConfig::default()
            .with_warmup(0)
            .with_iterations(0)
            .with_confidence(ConfidenceLevel::P95);
        assert_eq!(config.warmup, 0);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.confidence, ConfidenceLevel::P95);
    }

    #[test]
    fn test_measure() {
        let (value, elapsed) = measure(|| {
            std::thread::sleep(Duration::from_millis(2));
            7
        });
        assert_eq!(value, 7);
        assert!(elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn test_invoke_reduces_result() {
        let invocation = invoke(|| Ok(vec![1usize, 2, 3])).unwrap();
        assert_eq!(invocation.outcome.len, 3);
        assert_eq!(invocation.allocated, None);
    }

    #[test]
    fn test_invoke_propagates_error() {
        let err = invoke::<usize, _>(|| Err(OperationError::Invariant("boom".into()))).unwrap_err();
        assert_eq!(err, OperationError::Invariant("boom".into()));
    }

    #[test]
    fn test_engine_sample_count_and_bounds() {
        let engine = Engine::new(TimingConfig::default().with_warmup(2).with_iterations(25));
        let op = Operation::read_only("sum", |f: &Numbers| Ok(f.0.iter().sum::<u64>()));

        let result = engine.run(&op, &fixture(100)).unwrap();
        assert_eq!(result.samples(), 25);
        assert_eq!(result.output_len, 4950);
        assert!(result.stats.min_ns <= result.stats.mean_ns);
        assert!(result.stats.mean_ns <= result.stats.max_ns);
        assert_eq!(result.allocated_bytes, None);
    }

    #[test]
    fn test_engine_counts_warmup_separately() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let engine = Engine::new(TimingConfig::default().with_warmup(4).with_iterations(6));
        let op = Operation::read_only("count", move |_: &Numbers| {
            counter.set(counter.get() + 1);
            Ok(0usize)
        });

        let result = engine.run(&op, &fixture(1)).unwrap();
        assert_eq!(calls.get(), 10);
        assert_eq!(result.samples(), 6);
    }

    #[test]
    fn test_engine_mutating_uses_clones() {
        let engine = Engine::new(TimingConfig::default().with_warmup(1).with_iterations(5));
        let op = Operation::mutating("push", |f: &mut Numbers| {
            f.0.push(99);
            Ok(f.0.len())
        });
        let shared = fixture(10);

        let result = engine.run(&op, &shared).unwrap();
        assert_eq!(shared, fixture(10));
        // Every invocation saw the original ten items.
        assert_eq!(result.output_len, 11);
    }

    #[test]
    fn test_engine_aborts_on_error() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let engine = Engine::new(TimingConfig::default().with_warmup(0).with_iterations(10));
        let op = Operation::read_only("flaky", move |_: &Numbers| {
            counter.set(counter.get() + 1);
            if counter.get() == 3 {
                Err(OperationError::Invariant("third call".into()))
            } else {
                Ok(1usize)
            }
        });

        let err = engine.run(&op, &fixture(1)).unwrap_err();
        assert_eq!(err, OperationError::Invariant("third call".into()));
        // No retry after the failure.
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_observe_strings_and_vectors() {
        assert_eq!("abc".observe().len, 3);
        assert_eq!(String::new().observe(), Outcome::new(0, 0));
        let v = vec!["x".to_string(), "yz".to_string()];
        assert_eq!(v.observe().len, 2);
        assert_ne!(v.observe().digest, vec!["x".to_string()].observe().digest);
    }
}
