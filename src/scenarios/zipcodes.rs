//! Bulk string lists shaped like postal codes (`0123 AA`).

use crate::perf::{
    size_param, BenchmarkConfiguration, Fixture, FixtureResult, OpResult, OperationError, Suite,
};
use std::hint::black_box;

/// Suite name.
pub const SUITE: &str = "zipcodes";

/// Number of zip codes.
pub const PARAM_COUNT: &str = "Count";

/// Default list size.
pub const DEFAULT_COUNT: [u64; 1] = [360_000];

const MAX_COUNT: usize = 10_000_000;

/// Format the `i`-th zip code.
pub fn zip_code(i: usize) -> String {
    format!("{i:04} AA")
}

/// Input data for the zipcodes suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCodesFixture {
    /// Pre-built zip codes `0000 AA`, `0001 AA`, ...
    pub zip_codes: Vec<String>,
}

impl ZipCodesFixture {
    /// Build `count` zip codes.
    pub fn with_count(count: usize) -> Self {
        Self {
            zip_codes: (0..count).map(zip_code).collect(),
        }
    }
}

impl Fixture for ZipCodesFixture {
    fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self> {
        let count = size_param(configuration, PARAM_COUNT, MAX_COUNT)?;
        Ok(Self::with_count(count))
    }
}

/// Build a new list of the same size from scratch.
pub fn create_list(f: &ZipCodesFixture) -> OpResult<Vec<String>> {
    let count = f.zip_codes.len();
    let mut list = Vec::with_capacity(count);
    for i in 0..count {
        list.push(zip_code(i));
    }
    Ok(list)
}

/// Copy every zip code with a suffix appended.
pub fn concat_suffix(f: &ZipCodesFixture) -> OpResult<Vec<String>> {
    let mut list = Vec::with_capacity(f.zip_codes.len());
    for zc in &f.zip_codes {
        list.push(format!("{zc} - ExtraSuffix"));
    }
    Ok(list)
}

/// Copy the first three bytes of every zip code into a new string and sum
/// their lengths.
pub fn substring_total(f: &ZipCodesFixture) -> OpResult<usize> {
    let mut total = 0;
    for zc in &f.zip_codes {
        if zc.len() > 3 {
            let prefix = zc.get(..3).map(str::to_owned).ok_or_else(|| {
                OperationError::Invariant(format!("no char boundary at 3 in {zc:?}"))
            })?;
            total += black_box(prefix).len();
        }
    }
    Ok(total)
}

/// Wrap every zip code in a longer sentence built from four pieces.
pub fn heavy_concat(f: &ZipCodesFixture) -> OpResult<Vec<String>> {
    let mut list = Vec::with_capacity(f.zip_codes.len());
    for zc in &f.zip_codes {
        list.push(["A location for x", "(", zc.as_str(), ")"].concat());
    }
    Ok(list)
}

/// The zipcodes suite.
pub fn suite() -> Suite<ZipCodesFixture> {
    Suite::new(SUITE, "bulk zip code list building and manipulation")
        .with_parameter(PARAM_COUNT, DEFAULT_COUNT)
        .read_only("create_list", create_list)
        .read_only("concat_suffix", concat_suffix)
        .read_only("substring_total", substring_total)
        .read_only("heavy_concat", heavy_concat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_code_format() {
        assert_eq!(zip_code(0), "0000 AA");
        assert_eq!(zip_code(123), "0123 AA");
        assert_eq!(zip_code(12_345), "12345 AA");
    }

    #[test]
    fn test_fixture_is_deterministic() {
        let config = BenchmarkConfiguration::new([(PARAM_COUNT, 1_000u64)]);
        let a = ZipCodesFixture::build(&config).unwrap();
        let b = ZipCodesFixture::build(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.zip_codes.len(), 1_000);
        assert_eq!(a.zip_codes[999], "0999 AA");
    }

    #[test]
    fn test_create_list_matches_fixture() {
        let f = ZipCodesFixture::with_count(50);
        assert_eq!(create_list(&f).unwrap(), f.zip_codes);
    }

    #[test]
    fn test_concatenations() {
        let f = ZipCodesFixture::with_count(3);
        assert_eq!(concat_suffix(&f).unwrap()[2], "0002 AA - ExtraSuffix");
        assert_eq!(heavy_concat(&f).unwrap()[1], "A location for x(0001 AA)");
    }

    #[test]
    fn test_substring_total() {
        let f = ZipCodesFixture::with_count(20_000);
        assert_eq!(substring_total(&f).unwrap(), 60_000);
        assert_eq!(substring_total(&ZipCodesFixture::with_count(0)).unwrap(), 0);
    }

    #[test]
    fn test_substring_total_rejects_split_char() {
        let f = ZipCodesFixture {
            zip_codes: vec!["0001 AA".to_string(), "ééé AA".to_string()],
        };
        assert!(matches!(
            substring_total(&f),
            Err(OperationError::Invariant(_))
        ));
    }
}
