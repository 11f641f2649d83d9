//! Program images and expected results in the plain-text formats used by the test suite.
//!
//! A program file holds one 32-bit instruction word per line in hexadecimal:
//!
//! ```text
//! # x1 = 5
//! 00500093
//! 0x00300113   // x2 = 3
//! ```
//!
//! An expected-result (`.ans`) file holds a single decimal or `0x`-prefixed
//! hexadecimal value.

use std::path::{Path, PathBuf};

/// Size of one instruction word in bytes.
pub const WORD_SIZE: u32 = 4;

/// Errors from reading program or expected-result files.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum ProgramError {
    /// Could not read {path:?}.
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The expected result is empty.
    EmptyExpected,

    /// '{0}' is not a 32-bit value.
    InvalidValue(String),
}

/// A sequence of instruction words, loaded at consecutive word addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<u32>,
}

impl Program {
    /// Creates a program from raw words.
    pub fn new(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// Parses the line-oriented hex format.
    ///
    /// Blank lines and `#` or `//` comments are skipped. Lines that do not hold a
    /// 32-bit hex word are skipped with a warning.
    pub fn parse(source: &str) -> Self {
        let words = source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = strip_comments(line);
                if line.is_empty() {
                    return None;
                }

                let digits = line
                    .strip_prefix("0x")
                    .or_else(|| line.strip_prefix("0X"))
                    .unwrap_or(line);

                match u32::from_str_radix(digits, 16) {
                    Ok(word) => Some(word),
                    Err(e) => {
                        tracing::warn!("Skipping line {}: '{}' ({})", index + 1, line, e);
                        None
                    }
                }
            })
            .collect();

        Self { words }
    }

    /// Reads and parses a program file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ProgramError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&source))
    }

    /// The instruction words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the program has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pairs each word with its address when the program is placed at `start`.
    pub fn placed_at(&self, start: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(move |(index, word)| (start.wrapping_add(index as u32 * WORD_SIZE), *word))
    }
}

/// Parses the content of an expected-result file.
pub fn parse_expected(source: &str) -> Result<u32, ProgramError> {
    let value = strip_comments(source);
    if value.is_empty() {
        return Err(ProgramError::EmptyExpected);
    }

    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| ProgramError::InvalidValue(value.to_string()))
}

/// Reads an expected-result file.
pub fn read_expected(path: impl AsRef<Path>) -> Result<u32, ProgramError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_expected(&source)
}

fn strip_comments(line: &str) -> &str {
    let line = line.split('#').next().unwrap_or_default();
    let line = line.split("//").next().unwrap_or_default();
    line.trim()
}
