//! Wildcard byte patterns.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A byte sequence with wildcard positions, e.g. `"48 8B 1D ?? ?? ?? ??"`.
///
/// A pattern matches a buffer window iff every non-wildcard position
/// matches exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<Option<u8>>,
}

impl BytePattern {
    /// Parse the textual form: whitespace-separated hex bytes, `??` or `?`
    /// for wildcards.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in pattern.split_whitespace() {
            if token == "??" || token == "?" {
                bytes.push(None);
                continue;
            }

            let value = u8::from_str_radix(token, 16)
                .map_err(|e| Error::InvalidPattern(format!("invalid token '{token}': {e}")))?;
            bytes.push(Some(value));
        }

        if bytes.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }

        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.bytes
    }

    /// Position and value of the first non-wildcard byte, used to skip
    /// through a buffer with `memchr` before the full positional check.
    pub fn first_literal(&self) -> Option<(usize, u8)> {
        self.bytes
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.map(|value| (i, value)))
    }

    /// Check the pattern against `buffer` starting at `pos`.
    pub fn matches_at(&self, buffer: &[u8], pos: usize) -> bool {
        if pos + self.bytes.len() > buffer.len() {
            return false;
        }
        self.bytes
            .iter()
            .enumerate()
            .all(|(i, b)| b.is_none_or(|value| buffer[pos + i] == value))
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .bytes
            .iter()
            .map(|b| match b {
                Some(value) => format!("{value:02X}"),
                None => "??".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&text)
    }
}

impl FromStr for BytePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
