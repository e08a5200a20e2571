//! Core types for docstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Etag: globally ordered version marker and its generator
//! - Document: document, metadata and write result types
//! - Limits: key length limits and key comparison rules
//! - CancellationToken: cooperative cancellation for scans
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod document;
pub mod error;
pub mod etag;
pub mod limits;

pub use cancel::CancellationToken;
pub use document::{
    collection_of, AddDocumentResult, DeletedDocument, Document, DocumentMetadata, Metadata,
    TouchResult, COLLECTION_METADATA_KEY, DELETE_MARKER_METADATA_KEY,
};
pub use error::{BoxError, ConcurrencyError, ConcurrencyKind, Error, Result};
pub use etag::{Etag, EtagGenerator, EtagParseError, SequentialEtagGenerator, ETAG_SIZE};
pub use limits::{KeyLimits, MAX_KEY_UTF16_UNITS, SYSTEM_KEY_PREFIX};
