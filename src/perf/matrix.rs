//! Parameter matrix expansion.
//!
//! A [`ParamSpace`] holds the declared benchmark parameters of a suite and
//! expands them into the Cartesian product of [`BenchmarkConfiguration`]s.
//! Expansion order is fixed: parameters in declaration order, the first
//! parameter varying slowest, values in declaration order.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building or overriding a parameter space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// An override names a parameter no selected suite declares.
    #[error("unknown parameter '{name}' (declared: {declared})")]
    UnknownParameter {
        /// Parameter named by the override.
        name: String,
        /// Comma separated list of declared parameters.
        declared: String,
    },

    /// An override string could not be parsed.
    #[error("invalid parameter override '{input}': {reason}")]
    InvalidOverride {
        /// The raw override text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Result type for matrix operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

/// One declared parameter and its ordered candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, e.g. `N`.
    pub name: String,
    /// Candidate values, duplicates removed, declaration order kept.
    pub values: Vec<u64>,
}

impl Parameter {
    /// Create a parameter. Repeated values are dropped so every expanded
    /// configuration is unique.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = u64>) -> Self {
        Self {
            name: name.into(),
            values: dedup_ordered(values),
        }
    }
}

fn dedup_ordered(values: impl IntoIterator<Item = u64>) -> Vec<u64> {
    let mut out: Vec<u64> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Concrete assignment of every declared parameter for one run.
///
/// Immutable once built; identifies one row of the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BenchmarkConfiguration {
    entries: Vec<(String, u64)>,
}

impl BenchmarkConfiguration {
    /// Build a configuration from ordered `(name, value)` pairs.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    /// Ordered entries.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// Number of parameters assigned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no parameter is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for BenchmarkConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "-");
        }
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl Serialize for BenchmarkConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Declared parameters of a suite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSpace {
    parameters: Vec<Parameter>,
}

impl ParamSpace {
    /// Create an empty space. It expands to a single empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter. Declaring the same name twice replaces its values
    /// but keeps its original position.
    #[must_use]
    pub fn with_parameter(mut self, name: &str, values: impl IntoIterator<Item = u64>) -> Self {
        let parameter = Parameter::new(name, values);
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
        self
    }

    /// Declared parameters in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Whether a parameter with this name is declared.
    pub fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    /// Replace the candidate values of a declared parameter.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::UnknownParameter`] when the name is not declared.
    pub fn override_values(&mut self, name: &str, values: &[u64]) -> MatrixResult<()> {
        let declared = self.declared_names();
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| MatrixError::UnknownParameter {
                name: name.to_string(),
                declared,
            })?;
        parameter.values = dedup_ordered(values.iter().copied());
        Ok(())
    }

    fn declared_names(&self) -> String {
        self.parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of configurations [`expand`](Self::expand) will produce.
    pub fn len(&self) -> usize {
        self.parameters
            .iter()
            .fold(1usize, |acc, p| acc.saturating_mul(p.values.len()))
    }

    /// True when expansion yields no configuration at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand into the full Cartesian product.
    pub fn expand(&self) -> Vec<BenchmarkConfiguration> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut configurations = Vec::with_capacity(self.len());
        let mut cursor = vec![0usize; self.parameters.len()];

        loop {
            configurations.push(self.configuration_at(&cursor));

            // Odometer step: the last parameter moves fastest.
            let mut position = self.parameters.len();
            loop {
                if position == 0 {
                    return configurations;
                }
                position -= 1;
                cursor[position] += 1;
                if cursor[position] < self.parameters[position].values.len() {
                    break;
                }
                cursor[position] = 0;
            }
        }
    }

    fn configuration_at(&self, cursor: &[usize]) -> BenchmarkConfiguration {
        BenchmarkConfiguration {
            entries: self
                .parameters
                .iter()
                .zip(cursor)
                .map(|(p, &i)| (p.name.clone(), p.values[i]))
                .collect(),
        }
    }
}

/// A requested replacement of a parameter's candidate values.
///
/// Parsed from `NAME=v1,v2` (applies to every selected suite declaring
/// `NAME`) or `SUITE.NAME=v1,v2` (applies to one suite). Values accept `_`
/// separators, e.g. `N=10,1_000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamOverride {
    /// Suite the override is scoped to, if any.
    pub suite: Option<String>,
    /// Parameter name.
    pub name: String,
    /// Replacement values.
    pub values: Vec<u64>,
}

impl ParamOverride {
    /// Create an override scoped to an optional suite.
    pub fn new(suite: Option<&str>, name: impl Into<String>, values: Vec<u64>) -> Self {
        Self {
            suite: suite.map(str::to_string),
            name: name.into(),
            values,
        }
    }

    /// Whether this override targets the given suite.
    pub fn applies_to(&self, suite: &str) -> bool {
        self.suite.as_deref().is_none_or(|s| s == suite)
    }
}

impl FromStr for ParamOverride {
    type Err = MatrixError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| MatrixError::InvalidOverride {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (key, raw_values) = input
            .split_once('=')
            .ok_or_else(|| invalid("expected NAME=v1,v2"))?;
        let key = key.trim();
        let (suite, name) = match key.split_once('.') {
            Some((suite, name)) => (Some(suite.trim()), name.trim()),
            None => (None, key),
        };
        if name.is_empty() || suite.is_some_and(str::is_empty) {
            return Err(invalid("empty suite or parameter name"));
        }

        let values = raw_values
            .split(',')
            .map(|v| v.trim().replace('_', ""))
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<u64>().map_err(|e| invalid(&e.to_string())))
            .collect::<MatrixResult<Vec<_>>>()?;
        if values.is_empty() {
            return Err(invalid("at least one value is required"));
        }

        Ok(Self::new(suite, name, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_single_parameter() {
        let space = ParamSpace::new().with_parameter("N", [10, 100, 1000]);
        let configs = space.expand();

        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].get("N"), Some(10));
        assert_eq!(configs[2].get("N"), Some(1000));
    }

    #[test]
    fn test_expand_order_first_parameter_slowest() {
        let space = ParamSpace::new()
            .with_parameter("A", [1, 2])
            .with_parameter("B", [7, 8, 9]);

        let labels: Vec<String> = space.expand().iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "A=1, B=7", "A=1, B=8", "A=1, B=9", "A=2, B=7", "A=2, B=8", "A=2, B=9"
            ]
        );
    }

    #[test]
    fn test_empty_values_yield_nothing() {
        let space = ParamSpace::new()
            .with_parameter("A", [1, 2])
            .with_parameter("B", []);
        assert!(space.expand().is_empty());
        assert_eq!(space.len(), 0);
    }

    #[test]
    fn test_no_parameters_single_configuration() {
        let configs = ParamSpace::new().expand();
        assert_eq!(configs.len(), 1);
        assert!(configs[0].is_empty());
        assert_eq!(configs[0].to_string(), "-");
    }

    #[test]
    fn test_duplicate_values_dropped() {
        let space = ParamSpace::new().with_parameter("N", [10, 10, 20]);
        assert_eq!(space.parameters()[0].values, vec![10, 20]);
    }

    #[test]
    fn test_override_values() {
        let mut space = ParamSpace::new().with_parameter("N", [10, 100]);
        space.override_values("N", &[5]).unwrap();
        assert_eq!(space.expand().len(), 1);

        let err = space.override_values("M", &[1]).unwrap_err();
        assert!(matches!(err, MatrixError::UnknownParameter { .. }));
    }

    #[test]
    fn test_parse_override() {
        let o: ParamOverride = "N=10, 1_000".parse().unwrap();
        assert_eq!(o.suite, None);
        assert_eq!(o.name, "N");
        assert_eq!(o.values, vec![10, 1000]);
        assert!(o.applies_to("anything"));

        let o: ParamOverride = "strings.InputSize=300".parse().unwrap();
        assert_eq!(o.suite.as_deref(), Some("strings"));
        assert!(o.applies_to("strings"));
        assert!(!o.applies_to("collections"));
    }

    #[test]
    fn test_parse_override_rejects_garbage() {
        assert!("N".parse::<ParamOverride>().is_err());
        assert!("N=".parse::<ParamOverride>().is_err());
        assert!("N=abc".parse::<ParamOverride>().is_err());
        assert!(".N=1".parse::<ParamOverride>().is_err());
    }

    #[test]
    fn test_configuration_serializes_as_map() {
        let config = BenchmarkConfiguration::new([("N", 10u64)]);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"N":10}"#);
    }
}
