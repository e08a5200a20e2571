//! Error types for the document store
//!
//! Expected, frequent conditions (etag conflicts, oversized keys, undecodable
//! payloads) are explicit variants so callers have to handle them. We use
//! `thiserror` for the `Display` and `Error` implementations.

use std::fmt;

use thiserror::Error;

use crate::etag::Etag;

/// Boxed error carried as the cause of decode failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for document store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document store
#[derive(Debug, Error)]
pub enum Error {
    /// Optimistic concurrency check failed
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Key exceeds the maximum key length
    #[error("The key must be at most {max} UTF-16 code units, key has {length}: '{key}'")]
    KeyTooLarge {
        /// Offending key
        key: String,
        /// Length in UTF-16 code units
        length: usize,
        /// Maximum allowed length in UTF-16 code units
        max: usize,
    },

    /// Payload carries a compression marker but no compression codec is installed
    #[error("Document '{key}' is compressed, but no compression codec is installed. Enable compression when dealing with compressed documents")]
    MissingCodec {
        /// Document key
        key: String,
        /// Underlying decode failure
        #[source]
        source: BoxError,
    },

    /// Payload or metadata could not be decoded
    #[error("Failed to de-serialize document '{key}'")]
    DataCorruption {
        /// Document key
        key: String,
        /// Underlying decode failure
        #[source]
        source: BoxError,
    },

    /// Cancellation was observed mid-operation
    #[error("Operation canceled")]
    Canceled,

    /// Serialization error on the write path
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage engine error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a DataCorruption error for `key`
    pub fn corruption(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::DataCorruption {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Concurrency error details, if this is one
    pub fn as_concurrency(&self) -> Option<&ConcurrencyError> {
        match self {
            Error::Concurrency(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this is a concurrency error of the given kind
    pub fn is_concurrency(&self, kind: ConcurrencyKind) -> bool {
        self.as_concurrency().map(|e| e.kind == kind).unwrap_or(false)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// ============================================================================
// Concurrency errors
// ============================================================================

/// What kind of optimistic concurrency failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcurrencyKind {
    /// Expected etag does not match the stored etag
    EtagMismatch,
    /// Caller expected an existing document but none exists
    UnexpectedEtagOnCreate,
    /// Storage reported a duplicate key or write conflict on insert/replace/delete
    ConcurrentWrite,
    /// Storage reported a write conflict while touching
    ConcurrentTouch,
}

impl fmt::Display for ConcurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcurrencyKind::EtagMismatch => "etag mismatch",
            ConcurrencyKind::UnexpectedEtagOnCreate => "non current etag (document deleted)",
            ConcurrencyKind::ConcurrentWrite => "concurrent write",
            ConcurrencyKind::ConcurrentTouch => "already modified",
        };
        f.write_str(s)
    }
}

/// An optimistic concurrency failure
///
/// Carries the operation that failed ("PUT", "DELETE", "INSERT", "TOUCH") and
/// the expected/actual etags where they are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyError {
    /// Failure kind
    pub kind: ConcurrencyKind,
    /// Document key
    pub key: String,
    /// Operation name
    pub operation: &'static str,
    /// Etag the caller expected
    pub expected: Option<Etag>,
    /// Etag found in storage
    pub actual: Option<Etag>,
}

impl ConcurrencyError {
    /// Create a new concurrency error without etag details
    pub fn new(kind: ConcurrencyKind, key: impl Into<String>, operation: &'static str) -> Self {
        ConcurrencyError {
            kind,
            key: key.into(),
            operation,
            expected: None,
            actual: None,
        }
    }

    /// Expected etag does not match the stored one
    pub fn etag_mismatch(
        key: impl Into<String>,
        operation: &'static str,
        expected: Etag,
        actual: Etag,
    ) -> Self {
        ConcurrencyError {
            expected: Some(expected),
            actual: Some(actual),
            ..Self::new(ConcurrencyKind::EtagMismatch, key, operation)
        }
    }
}

impl fmt::Display for ConcurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted on document '{}' failed: {}",
            self.operation, self.key, self.kind
        )?;
        if let Some(expected) = self.expected {
            write!(f, ", expected etag {}", expected)?;
        }
        if let Some(actual) = self.actual {
            write!(f, ", actual etag {}", actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConcurrencyError {}
