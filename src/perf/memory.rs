//! Allocation accounting.
//!
//! Bytes are counted by the [`alloc_tracker`] allocator. Install it in a
//! binary with `#[global_allocator]`; when it is absent, [`track`] returns
//! `None` and allocation is reported as unmeasured instead of zero.

use alloc_tracker::Session;
use std::alloc::System;
use std::hint::black_box;
use std::sync::OnceLock;

pub use alloc_tracker::Allocator;

/// Counting allocator over the system allocator.
///
/// ```ignore
/// #[global_allocator]
/// static ALLOCATOR: CountingAllocator = CountingAllocator::system();
/// ```
pub type CountingAllocator = Allocator<System>;

const CALIBRATION_BYTES: usize = 64;

/// Whether a counting allocator is serving allocations in this process.
///
/// Detected once by tracking a known allocation.
pub fn is_installed() -> bool {
    static INSTALLED: OnceLock<bool> = OnceLock::new();
    *INSTALLED.get_or_init(|| {
        let (_, bytes) = tracked(|| black_box(Vec::<u8>::with_capacity(CALIBRATION_BYTES)));
        bytes >= CALIBRATION_BYTES as u64
    })
}

/// Run `f` and return the bytes it allocated on the calling thread, or
/// `None` when no counting allocator is installed.
///
/// Setting up and reading the tracking session happens outside `f`, so only
/// allocations made by `f` itself are counted.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Option<u64>) {
    if !is_installed() {
        return (f(), None);
    }
    let (result, bytes) = tracked(f);
    (result, Some(bytes))
}

fn tracked<R>(f: impl FnOnce() -> R) -> (R, u64) {
    let session = Session::new();
    let operation = session.operation("invocation");
    let result = {
        let _span = operation.measure_thread();
        f()
    };
    drop(operation);

    let bytes = session
        .to_report()
        .operations()
        .map(|(_, op)| op.total_bytes_allocated())
        .sum();
    (result, bytes)
}
