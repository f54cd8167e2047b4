//! String building and replacement techniques.
//!
//! Repeated concatenation into a fresh string is compared against appending
//! to one growing buffer, and regex replacement against split and join.

use crate::perf::{
    size_param, BenchmarkConfiguration, Fixture, FixtureResult, OpResult, OperationError, Suite,
};
use regex::Regex;

/// Suite name.
pub const SUITE: &str = "strings";

/// Input length parameter.
pub const PARAM_INPUT_SIZE: &str = "InputSize";

/// Default input sizes. The naive loops are quadratic, larger sizes are opt-in.
pub const DEFAULT_INPUT_SIZE: [u64; 4] = [10, 100, 1_000, 10_000];

const MAX_INPUT_SIZE: usize = 10_000_000;

/// Token repeated to build the inputs.
pub const TOKEN: &str = "abc";

/// Replacement for every [`TOKEN`] occurrence.
pub const REPLACEMENT: &str = "XYZ";

/// Input data for the strings suite.
#[derive(Debug, Clone)]
pub struct StringsFixture {
    /// `abc` repeated and cut to `InputSize` bytes.
    pub text: String,
    /// The word to replace.
    pub word: String,
    /// `word` compiled as a pattern.
    pub pattern: Regex,
    /// `InputSize / 3 + 1` copies of `abc`.
    pub words: Vec<String>,
}

impl StringsFixture {
    /// Build the fixture for a given input size.
    ///
    /// # Errors
    ///
    /// Fails only if the pattern does not compile.
    pub fn with_size(input_size: usize) -> FixtureResult<Self> {
        let copies = input_size / TOKEN.len() + 1;
        let mut text = TOKEN.repeat(copies);
        text.truncate(input_size);

        Ok(Self {
            text,
            word: TOKEN.to_string(),
            pattern: Regex::new(&regex::escape(TOKEN))?,
            words: vec![TOKEN.to_string(); copies],
        })
    }
}

impl PartialEq for StringsFixture {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.word == other.word
            && self.pattern.as_str() == other.pattern.as_str()
            && self.words == other.words
    }
}

impl Fixture for StringsFixture {
    fn build(configuration: &BenchmarkConfiguration) -> FixtureResult<Self> {
        let input_size = size_param(configuration, PARAM_INPUT_SIZE, MAX_INPUT_SIZE)?;
        Self::with_size(input_size)
    }
}

/// Concatenate the words, allocating a new string at every step.
pub fn naive_concat(f: &StringsFixture) -> OpResult<String> {
    let mut result = String::new();
    for word in &f.words {
        result = [result.as_str(), word.as_str()].concat();
    }
    Ok(result)
}

/// Replace every occurrence of the word through the compiled pattern.
pub fn regex_replace(f: &StringsFixture) -> OpResult<String> {
    Ok(f.pattern.replace_all(&f.text, REPLACEMENT).into_owned())
}

/// Split on the word and join the pieces with the replacement.
pub fn split_rejoin(f: &StringsFixture) -> OpResult<String> {
    let tokens: Vec<&str> = f.text.split(f.word.as_str()).collect();
    Ok(tokens.join(REPLACEMENT))
}

/// Rebuild the first half of the text one single-character slice at a time.
pub fn substring_loop(f: &StringsFixture) -> OpResult<String> {
    let length = f.text.len() / 2;
    let mut result = String::new();
    for i in 0..length {
        let piece = f.text.get(i..i + 1).ok_or_else(|| {
            OperationError::Invariant(format!("byte {i} is not a character boundary"))
        })?;
        result = [result.as_str(), piece].concat();
    }
    Ok(result)
}

/// Append the words to one growing buffer.
pub fn builder_concat(f: &StringsFixture) -> OpResult<String> {
    let mut builder = String::new();
    for word in &f.words {
        builder.push_str(word);
    }
    Ok(builder)
}

/// The strings suite. `builder_concat` is the baseline.
pub fn suite() -> Suite<StringsFixture> {
    Suite::new(SUITE, "naive vs builder concatenation, regex vs split/join")
        .with_parameter(PARAM_INPUT_SIZE, DEFAULT_INPUT_SIZE)
        .read_only("naive_concat", naive_concat)
        .read_only("regex_replace", regex_replace)
        .read_only("split_rejoin", split_rejoin)
        .read_only("substring_loop", substring_loop)
        .read_only("builder_concat", builder_concat)
        .baseline("builder_concat")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: u64) -> BenchmarkConfiguration {
        BenchmarkConfiguration::new([(PARAM_INPUT_SIZE, size)])
    }

    #[test]
    fn test_fixture_shape() {
        let f = StringsFixture::build(&config(10)).unwrap();
        assert_eq!(f.text, "abcabcabca");
        assert_eq!(f.words.len(), 4);
        assert_eq!(f.word, "abc");

        let empty = StringsFixture::with_size(0).unwrap();
        assert!(empty.text.is_empty());
        assert_eq!(empty.words.len(), 1);
    }

    #[test]
    fn test_fixture_is_deterministic() {
        for size in DEFAULT_INPUT_SIZE {
            let a = StringsFixture::build(&config(size)).unwrap();
            let b = StringsFixture::build(&config(size)).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.text.len() as u64, size);
        }
    }

    #[test]
    fn test_fixture_rejects_oversized_input() {
        let err = StringsFixture::build(&config(MAX_INPUT_SIZE as u64 + 1)).unwrap_err();
        assert!(err.to_string().contains("InputSize"));
    }

    #[test]
    fn test_naive_matches_builder() {
        // 297 / 3 + 1 = 100 tokens.
        let f = StringsFixture::with_size(297).unwrap();
        assert_eq!(f.words.len(), 100);

        let naive = naive_concat(&f).unwrap();
        let builder = builder_concat(&f).unwrap();
        assert_eq!(naive, builder);
        assert_eq!(naive.len(), 300);
    }

    #[test]
    fn test_regex_matches_split_join() {
        for size in [0, 1, 10, 11, 12, 100, 1_000] {
            let f = StringsFixture::with_size(size).unwrap();
            assert_eq!(regex_replace(&f).unwrap(), split_rejoin(&f).unwrap(), "size {size}");
        }
        let f = StringsFixture::with_size(10).unwrap();
        assert_eq!(regex_replace(&f).unwrap(), "XYZXYZXYZa");
    }

    #[test]
    fn test_substring_loop_rebuilds_first_half() {
        let f = StringsFixture::with_size(100).unwrap();
        assert_eq!(substring_loop(&f).unwrap(), &f.text[..50]);
    }

    #[test]
    fn test_substring_loop_rejects_multibyte_text() {
        let mut f = StringsFixture::with_size(10).unwrap();
        f.text = "ééé".to_string();
        assert!(matches!(
            substring_loop(&f),
            Err(OperationError::Invariant(_))
        ));
    }

    #[test]
    fn test_baseline() {
        let suite = suite();
        assert!(suite.operation("builder_concat").unwrap().is_baseline());
        assert!(!suite.operation("naive_concat").unwrap().is_baseline());
    }
}
