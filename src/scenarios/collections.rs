//! Concurrent vs. plain collections.
//!
//! Compares a sharded concurrent map against a `HashMap` behind a `Mutex`,
//! linear search in a `Vec`, and an unordered concurrent bag. All operations
//! run on one thread; the point is the single-threaded cost of the
//! synchronisation each container carries.

use crate::perf::{
    size_param, BenchmarkConfiguration, Fixture, FixtureResult, OpResult, OperationError, Suite,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Suite name.
pub const SUITE: &str = "collections";

/// Collection size parameter.
pub const PARAM_N: &str = "N";

/// Default sizes. `list_contains` is quadratic, larger sizes are opt-in.
pub const DEFAULT_N: [u64; 4] = [10, 100, 1_000, 10_000];

const MAX_N: usize = 10_000_000;

/// Unordered concurrent collection, the counterpart of a .NET-style bag.
///
/// Items are keyed by an insertion counter so duplicates are kept.
pub struct ConcurrentBag<T> {
    items: DashMap<u64, T>,
    next: AtomicU64,
}

impl<T> ConcurrentBag<T> {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            next: AtomicU64::new(0),
        }
    }

    /// Add an item. Safe to call from several threads at once.
    pub fn add(&self, item: T) {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.items.insert(id, item);
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the bag holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Visit every item in unspecified order.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, &T) -> A) -> A {
        self.items.iter().fold(init, |acc, entry| f(acc, entry.value()))
    }
}

impl<T: Clone> ConcurrentBag<T> {
    /// Items in insertion order.
    pub fn to_vec(&self) -> Vec<T> {
        let mut entries: Vec<(u64, T)> = self
            .items
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, item)| item).collect()
    }
}

impl<T> Default for ConcurrentBag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ConcurrentBag<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            next: AtomicU64::new(self.next.load(Ordering::Relaxed)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentBag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentBag")
            .field("len", &self.len())
            .finish()
    }
}

/// `HashMap` guarded by a `Mutex`, taken once per access.
#[derive(Debug, Default)]
pub struct LockedMap {
    inner: Mutex<HashMap<u64, u64>>,
}

impl LockedMap {
    /// Wrap a map.
    pub fn new(map: HashMap<u64, u64>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Look up a key under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::LockPoisoned`] if a previous holder panicked.
    pub fn get(&self, key: u64) -> OpResult<Option<u64>> {
        let guard = self.inner.lock().map_err(poisoned)?;
        Ok(guard.get(&key).copied())
    }

    /// Insert under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::LockPoisoned`] if a previous holder panicked.
    pub fn insert(&self, key: u64, value: u64) -> OpResult<()> {
        let mut guard = self.inner.lock().map_err(poisoned)?;
        guard.insert(key, value);
        Ok(())
    }

    /// Number of entries.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::LockPoisoned`] if a previous holder panicked.
    pub fn len(&self) -> OpResult<usize> {
        Ok(self.inner.lock().map_err(poisoned)?.len())
    }

    fn entries(&self) -> Vec<(u64, u64)> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(u64, u64)> = guard.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_unstable();
        entries
    }
}

impl Clone for LockedMap {
    fn clone(&self) -> Self {
        // Cloning only copies data, so a poisoned map is still usable here.
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Self::new(guard.clone())
    }
}

fn poisoned<T>(err: PoisonError<T>) -> OperationError {
    OperationError::LockPoisoned(err.to_string())
}

/// Input data for the collections suite: every container holds `0..N`.
#[derive(Debug, Clone)]
pub struct CollectionsFixture {
    /// Configured size.
    pub n: usize,
    /// Concurrent map, `i -> i`.
    pub concurrent_map: DashMap<u64, u64>,
    /// Locked map, `i -> i`.
    pub locked_map: LockedMap,
    /// Vector `0..N`.
    pub list: Vec<u64>,
    /// Bag holding `0..N`.
    pub bag: ConcurrentBag<u64>,
}

impl CollectionsFixture {
    /// Build the fixture for a given size.
    pub fn with_size(n: usize) -> Self {
        let concurrent_map = DashMap::with_capacity(n);
        let mut map = HashMap::with_capacity(n);
        let mut list = Vec::with_capacity(n);
        let bag = ConcurrentBag::new();

        for i in 0..n as u64 {
            concurrent_map.insert(i, i);
            map.insert(i, i);
            list.push(i);
            bag.add(i);
        }

        Self {
            n,
            concurrent_map,
            locked_map: LockedMap::new(map),
            list,
            bag,
        }
    }

    fn concurrent_entries(&self) -> Vec<(u64, u64)> {
        let mut entries: Vec<(u64, u64)> = self
            .concurrent_map
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        entries.sort_unstable();
        entries
    }
}

impl PartialEq for CollectionsFixture {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n
            && self.list == other.list
            && self.bag.to_vec() == other.bag.to_vec()
            && self.concurrent_entries() == other.concurrent_entries()
            && self.locked_map.entries() == other.locked_map.entries()
    }
}

impl Fixture for CollectionsFixture {
    fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self> {
        let n = size_param(configuration, PARAM_N, MAX_N)?;
        Ok(Self::with_size(n))
    }
}

/// Look up every key `0..N` in the concurrent map. Returns the hit count.
pub fn concurrent_map_read(f: &CollectionsFixture) -> OpResult<usize> {
    let mut found = 0;
    for i in 0..f.n as u64 {
        if f.concurrent_map.get(&i).is_some() {
            found += 1;
        }
    }
    Ok(found)
}

/// Overwrite every key with `2 * i`. Returns the map size.
pub fn concurrent_map_write(f: &mut CollectionsFixture) -> OpResult<usize> {
    for i in 0..f.n as u64 {
        f.concurrent_map.insert(i, i * 2);
    }
    Ok(f.concurrent_map.len())
}

/// Look up every key, taking the lock once per lookup.
pub fn locked_map_read(f: &CollectionsFixture) -> OpResult<usize> {
    let mut found = 0;
    for i in 0..f.n as u64 {
        if f.locked_map.get(i)?.is_some() {
            found += 1;
        }
    }
    Ok(found)
}

/// Overwrite every key with `2 * i`, taking the lock once per insert.
pub fn locked_map_write(f: &mut CollectionsFixture) -> OpResult<usize> {
    for i in 0..f.n as u64 {
        f.locked_map.insert(i, i * 2)?;
    }
    f.locked_map.len()
}

/// Linear search for every value `0..N`.
pub fn list_contains(f: &CollectionsFixture) -> OpResult<usize> {
    Ok((0..f.n as u64).filter(|i| f.list.contains(i)).count())
}

/// Push `0..N` onto a fresh vector.
pub fn list_add(f: &CollectionsFixture) -> OpResult<Vec<u64>> {
    let mut list = Vec::new();
    for i in 0..f.n as u64 {
        list.push(i);
    }
    Ok(list)
}

/// Visit every bag item. Returns the number visited.
pub fn concurrent_bag_enumerate(f: &CollectionsFixture) -> OpResult<usize> {
    Ok(f.bag.fold(0usize, |count, _| count + 1))
}

/// Add `0..N` to a fresh bag. Returns its size.
pub fn concurrent_bag_add(f: &CollectionsFixture) -> OpResult<usize> {
    let bag = ConcurrentBag::new();
    for i in 0..f.n as u64 {
        bag.add(i);
    }
    Ok(bag.len())
}

/// The collections suite.
pub fn suite() -> Suite<CollectionsFixture> {
    Suite::new(SUITE, "concurrent map vs locked map vs list vs bag")
        .with_parameter(PARAM_N, DEFAULT_N)
        .read_only("concurrent_map_read", concurrent_map_read)
        .mutating("concurrent_map_write", concurrent_map_write)
        .read_only("locked_map_read", locked_map_read)
        .mutating("locked_map_write", locked_map_write)
        .read_only("list_contains", list_contains)
        .read_only("list_add", list_add)
        .read_only("concurrent_bag_enumerate", concurrent_bag_enumerate)
        .read_only("concurrent_bag_add", concurrent_bag_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::{OperationKind, SuiteRunner};

    fn config(n: u64) -> BenchmarkConfiguration {
        BenchmarkConfiguration::new([(PARAM_N, n)])
    }

    #[test]
    fn test_fixture_is_deterministic() {
        let a = CollectionsFixture::build(&config(200)).unwrap();
        let b = CollectionsFixture::build(&config(200)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.list.len(), 200);
        assert_eq!(a.bag.len(), 200);
        assert_eq!(a.concurrent_map.len(), 200);
    }

    #[test]
    fn test_fixture_requires_n() {
        let err = CollectionsFixture::build(&BenchmarkConfiguration::default()).unwrap_err();
        assert!(err.to_string().contains("missing parameter 'N'"));
    }

    #[test]
    fn test_read_operations_find_all_keys() {
        let f = CollectionsFixture::with_size(1_000);
        assert_eq!(concurrent_map_read(&f).unwrap(), 1_000);
        assert_eq!(locked_map_read(&f).unwrap(), 1_000);
        assert_eq!(list_contains(&f).unwrap(), 1_000);
        assert_eq!(concurrent_bag_enumerate(&f).unwrap(), 1_000);
    }

    #[test]
    fn test_add_operations() {
        let f = CollectionsFixture::with_size(10);
        assert_eq!(list_add(&f).unwrap(), (0..10).collect::<Vec<u64>>());
        assert_eq!(concurrent_bag_add(&f).unwrap(), 10);
    }

    #[test]
    fn test_write_operations_double_values() {
        let mut f = CollectionsFixture::with_size(5);
        assert_eq!(concurrent_map_write(&mut f).unwrap(), 5);
        assert_eq!(locked_map_write(&mut f).unwrap(), 5);
        assert_eq!(*f.concurrent_map.get(&4).unwrap(), 8);
        assert_eq!(f.locked_map.get(4).unwrap(), Some(8));
    }

    #[test]
    fn test_mutating_operations_leave_fixture_untouched() {
        let suite = suite();
        let fixture = CollectionsFixture::with_size(50);
        let pristine = fixture.clone();

        for name in ["concurrent_map_write", "locked_map_write"] {
            let op = suite.operation(name).unwrap();
            assert_eq!(op.kind(), OperationKind::Mutating);
            op.invoke(&fixture).unwrap();
        }
        assert_eq!(fixture, pristine);
        assert_eq!(*fixture.concurrent_map.get(&7).unwrap(), 7);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let f = CollectionsFixture::with_size(3);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = f.locked_map.inner.lock().unwrap();
            panic!("poison the lock");
        }));

        assert!(matches!(
            locked_map_read(&f),
            Err(OperationError::LockPoisoned(_))
        ));
        // Clone recovers the data.
        assert_eq!(f.locked_map.clone().len().unwrap(), 3);
    }

    #[test]
    fn test_bag_keeps_duplicates_in_order() {
        let bag = ConcurrentBag::new();
        bag.add("a");
        bag.add("b");
        bag.add("a");
        assert_eq!(bag.to_vec(), vec!["a", "b", "a"]);

        let copy = bag.clone();
        copy.add("c");
        assert_eq!(bag.len(), 3);
        assert_eq!(copy.len(), 4);
    }

    #[test]
    fn test_suite_layout() {
        let suite = suite();
        let ops = suite.operations();
        assert_eq!(ops.len(), 8);
        assert_eq!(
            ops.iter().filter(|o| o.kind == OperationKind::Mutating).count(),
            2
        );
        assert_eq!(suite.parameters().len(), DEFAULT_N.len());
    }
}
