//! Ordered table adapter
//!
//! This trait is the contract between the document store and the underlying
//! transactional ordered-table engine. It exposes one record set through two
//! indexes:
//!
//! - **by_key**: ordered by the key's collation form (case-folded, symbols and
//!   punctuation removed), ties broken by the case-folded key
//! - **by_etag**: ordered by the etag's sortable byte form
//!
//! All decisions (etag checks, codecs, cache, limits) live in the document
//! store. Implementations only seek, move and mutate, and report conflicts as
//! [`TableError`] values instead of overwriting silently.

use chrono::{DateTime, Utc};
use docstore_core::{Error, Etag, EtagGenerator};
use thiserror::Error;

/// Result type alias for table operations
pub type TableResult<T> = std::result::Result<T, TableError>;

/// One row of the documents table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Key, case as written
    pub key: String,
    /// Etag of the last write
    pub etag: Etag,
    /// Time of the last content write
    pub last_modified: DateTime<Utc>,
    /// Encoded body bytes (output of the codec pipeline)
    pub data: Vec<u8>,
    /// Raw JSON metadata bytes
    pub metadata: Vec<u8>,
}

impl StoredDocument {
    /// Stored size: metadata bytes plus encoded body bytes
    pub fn size_on_disk(&self) -> u64 {
        (self.metadata.len() + self.data.len()) as u64
    }
}

/// Starting position of a by_key seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySeek<'a> {
    /// First record whose collation form is at or after the collation form of
    /// the given text
    AtOrAfter(&'a str),
    /// First record positioned strictly after the record with this key
    After(&'a str),
}

/// Table-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Insert hit an existing key
    #[error("Duplicate key: {0}")]
    KeyDuplicate(String),

    /// The row changed or vanished since it was read
    #[error("Write conflict on key: {0}")]
    WriteConflict(String),

    /// Any other engine failure
    #[error("Table engine error: {0}")]
    Engine(String),
}

impl From<TableError> for Error {
    fn from(e: TableError) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Ordered table adapter consumed by the document store
///
/// Thread safety: all methods must be safe to call concurrently from multiple
/// threads.
pub trait DocumentTable: Send + Sync {
    // ========== by_key ==========

    /// Seek-equal on by_key (case-insensitive)
    fn seek_key(&self, key: &str) -> TableResult<Option<StoredDocument>>;

    /// Next record in by_key order from `seek`
    ///
    /// When `prefix` is given the index range is restricted to records whose
    /// collation form starts with the collation form of `prefix`; the first
    /// record past that range yields `None`.
    fn next_by_key(
        &self,
        seek: KeySeek<'_>,
        prefix: Option<&str>,
    ) -> TableResult<Option<StoredDocument>>;

    // ========== by_etag ==========

    /// First record with an etag strictly greater than `after`
    fn next_by_etag(&self, after: &Etag) -> TableResult<Option<StoredDocument>>;

    /// Last record with an etag strictly less than `before`
    fn prev_by_etag(&self, before: &Etag) -> TableResult<Option<StoredDocument>>;

    /// Record with the smallest etag
    fn first_by_etag(&self) -> TableResult<Option<StoredDocument>>;

    /// Record with the greatest etag
    fn last_by_etag(&self) -> TableResult<Option<StoredDocument>>;

    /// Bulk relative move along by_etag
    ///
    /// Starting at the record whose etag is `from`, moves `offset` records
    /// (negative moves backwards) and returns the etag landed on. Returns
    /// `None` when `from` is not a record or the move would pass either end.
    fn move_by_etag(&self, from: &Etag, offset: isize) -> TableResult<Option<Etag>>;

    // ========== mutation ==========

    /// Insert a new record; `KeyDuplicate` if the key exists
    fn insert(&self, document: StoredDocument) -> TableResult<()>;

    /// Replace the record for `key` in place
    ///
    /// `WriteConflict` unless the stored row still carries `expected_etag`.
    fn replace(&self, key: &str, expected_etag: &Etag, document: StoredDocument)
        -> TableResult<()>;

    /// Delete the record for `key` from both indexes
    ///
    /// `WriteConflict` unless the stored row still carries `expected_etag`.
    fn delete(&self, key: &str, expected_etag: &Etag) -> TableResult<()>;

    // ========== etag-stamped mutation ==========

    /// Insert `document` under a fresh etag from `etags`
    ///
    /// Rows must become visible on by_etag in the order their etags were
    /// allocated, otherwise a scan that checkpointed past a later etag never
    /// sees an earlier one committed after it. The default allocates before
    /// calling [`insert`](Self::insert) and relies on the surrounding
    /// transaction for that ordering; tables without one must override this
    /// and allocate while holding their write lock.
    fn insert_stamped(
        &self,
        mut document: StoredDocument,
        etags: &dyn EtagGenerator,
    ) -> TableResult<Etag> {
        document.etag = etags.next_etag();
        let etag = document.etag;
        self.insert(document)?;
        Ok(etag)
    }

    /// Replace the record for `key` under a fresh etag from `etags`
    ///
    /// Same ordering contract as [`insert_stamped`](Self::insert_stamped).
    fn replace_stamped(
        &self,
        key: &str,
        expected_etag: &Etag,
        mut document: StoredDocument,
        etags: &dyn EtagGenerator,
    ) -> TableResult<Etag> {
        document.etag = etags.next_etag();
        let etag = document.etag;
        self.replace(key, expected_etag, document)?;
        Ok(etag)
    }

    // ========== live document counter ==========

    /// Atomic (escrow) update of the live document counter
    fn increment_document_count(&self, delta: i64);

    /// Current value of the live document counter
    fn document_count(&self) -> u64;
}
