//! Key limits and key comparison rules
//!
//! Keys are case-preserved but compared case-insensitively. Length is measured
//! in UTF-16 code units: a key may occupy at most 2048 bytes of UTF-16, i.e.
//! 1024 code units. Violations are rejected before any storage access.

use crate::error::{Error, Result};

/// Maximum key length in UTF-16 code units
pub const MAX_KEY_UTF16_UNITS: usize = 1024;

/// Key prefix of system documents
pub const SYSTEM_KEY_PREFIX: &str = "Docstore/";

/// Key limits enforced by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLimits {
    /// Maximum key length in UTF-16 code units (default: 1024)
    pub max_key_utf16_units: usize,
}

impl Default for KeyLimits {
    fn default() -> Self {
        KeyLimits {
            max_key_utf16_units: MAX_KEY_UTF16_UNITS,
        }
    }
}

impl KeyLimits {
    /// Validate a key length
    ///
    /// Returns `Err(Error::KeyTooLarge)` if the key is longer than the limit.
    pub fn validate_key(&self, key: &str) -> Result<()> {
        let length = key.encode_utf16().count();
        if length > self.max_key_utf16_units {
            return Err(Error::KeyTooLarge {
                key: key.to_string(),
                length,
                max: self.max_key_utf16_units,
            });
        }
        Ok(())
    }
}

/// Whether a character is ignored by relaxed key comparison and collation
///
/// Covers ASCII punctuation and symbols plus any non-ASCII character that is
/// neither alphanumeric, whitespace nor control.
#[inline]
pub fn is_symbol_or_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        !(c.is_alphanumeric() || c.is_whitespace() || c.is_control())
    }
}

/// Case-fold a key for case-insensitive equality
pub fn fold_case(key: &str) -> String {
    key.chars().flat_map(char::to_lowercase).collect()
}

/// Collation form of a key: case-folded with symbols and punctuation removed
///
/// The by_key index orders keys by this form first, so keys that differ only
/// in separators ("users/1", "USERS-1") sort next to each other.
pub fn collation_key(key: &str) -> String {
    key.chars()
        .filter(|c| !is_symbol_or_punctuation(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive `starts_with`
pub fn starts_with_ignore_case(key: &str, prefix: &str) -> bool {
    let mut key_chars = key.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| key_chars.next() == Some(p))
}

/// Relaxed prefix test ignoring case, symbols and punctuation
///
/// Walks `prefix`, skipping symbol/punctuation characters on both sides, and
/// compares the remaining characters case-insensitively. Running out of key
/// characters before the prefix is exhausted is a mismatch.
pub fn starts_with_ignore_case_and_symbols(key: &str, prefix: &str) -> bool {
    let mut key_chars = key.chars().filter(|c| !is_symbol_or_punctuation(*c));
    for prefix_char in prefix.chars().filter(|c| !is_symbol_or_punctuation(*c)) {
        let key_char = match key_chars.next() {
            Some(c) => c,
            None => return false,
        };
        if key_char == prefix_char {
            continue;
        }
        if key_char.to_uppercase().eq(prefix_char.to_uppercase()) {
            continue;
        }
        return false;
    }
    true
}
