//! # Built-in Scenarios
//!
//! The suites shipped with the harness. Each submodule exposes its fixture,
//! one public function per operation (so criterion benches can call the same
//! bodies) and a `suite()` constructor.
//!
//! | Suite         | Parameter   | Operations |
//! |---------------|-------------|------------|
//! | `collections` | `N`         | map reads/writes, list search/append, bag enumerate/add |
//! | `strings`     | `InputSize` | naive/builder concat, regex vs split/join, substring loop |
//! | `zipcodes`    | `Count`     | list build, suffix concat, substring total, heavy concat |

pub mod collections;
pub mod strings;
pub mod zipcodes;

use crate::perf::{Registry, RegistryResult};

/// Registry holding every built-in suite in a fixed order.
///
/// # Errors
///
/// Fails only if two suites or operations share a name.
pub fn registry() -> RegistryResult<Registry> {
    let mut registry = Registry::new();
    registry.register(collections::suite())?;
    registry.register(strings::suite())?;
    registry.register(zipcodes::suite())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = registry().unwrap();
        assert_eq!(registry.names(), vec!["collections", "strings", "zipcodes"]);

        let operations: usize = registry.suites().map(|s| s.operations().len()).sum();
        assert_eq!(operations, 8 + 5 + 4);
    }
}
