//! Document store
//!
//! `DocumentStore` is the document storage layer: it maps keys to JSON bodies
//! plus metadata, stamps every write with a fresh etag, and enforces
//! optimistic concurrency against the etag the caller last read.
//!
//! # Collaborators
//!
//! - [`DocumentTable`]: ordered table with by_key and by_etag indexes
//! - [`CodecPipeline`]: transforms body bytes on write and read
//! - [`DocumentCache`]: decoded documents keyed by (key, etag)
//! - [`EtagGenerator`]: source of unique, increasing etags
//!
//! # Write Path
//!
//! ```text
//! validate key ─► seek by key ─► etag check ─► encode ─► new etag ─► insert/replace
//!                                                                        │
//!                                          counter += 1 (create) ◄───────┤
//!                                          cache.remove(key, etag) ◄─────┘
//! ```
//!
//! Storage-level conflicts (another writer got in between the seek and the
//! mutation) surface as `ConcurrentWrite`; the store never retries.

mod builder;
pub mod config;

use std::sync::Arc;

use chrono::Utc;
use docstore_core::{
    AddDocumentResult, ConcurrencyError, ConcurrencyKind, DeletedDocument, Document,
    DocumentMetadata, Error, Etag, EtagGenerator, KeyLimits, Metadata, Result, TouchResult,
};
use docstore_storage::{CodecPipeline, DocumentCache, DocumentTable, StoredDocument, TableError};
use serde_json::Value;
use tracing::debug;

use crate::touches::EtagTouchLedger;

pub use builder::DocumentStoreBuilder;
pub use config::{CacheConfig, StoreConfig, CONFIG_FILE_NAME};

const OP_PUT: &str = "PUT";
const OP_INSERT: &str = "INSERT";
const OP_DELETE: &str = "DELETE";
const OP_TOUCH: &str = "TOUCH";

/// Document storage over an ordered table
///
/// Thread-safe: every operation takes `&self`; concurrent writers are
/// serialized by the table and detected through etags.
pub struct DocumentStore {
    pub(crate) table: Arc<dyn DocumentTable>,
    pub(crate) codecs: CodecPipeline,
    pub(crate) cache: Arc<dyn DocumentCache>,
    pub(crate) etags: Arc<dyn EtagGenerator>,
    pub(crate) touches: EtagTouchLedger,
    pub(crate) limits: KeyLimits,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("codecs", &self.codecs)
            .field("touches", &self.touches.len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Start configuring a store over `table`
    pub fn builder(table: Arc<dyn DocumentTable>) -> DocumentStoreBuilder {
        DocumentStoreBuilder::new(table)
    }

    /// Build a store over `table` from configuration
    pub fn from_config(table: Arc<dyn DocumentTable>, config: &StoreConfig) -> Result<Self> {
        DocumentStoreBuilder::from_config(table, config)?.build()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create or replace a document
    ///
    /// When `expected_etag` is given it must match the stored etag (or be
    /// `Etag::EMPTY` / absent when the document does not exist).
    ///
    /// # Errors
    ///
    /// - `KeyTooLarge` before any storage access
    /// - `Concurrency(EtagMismatch)` when the stored etag differs
    /// - `Concurrency(UnexpectedEtagOnCreate)` when an etag is expected but
    ///   the document does not exist. This includes the etag of a document
    ///   that has since been deleted, which is never reported as
    ///   `EtagMismatch`
    /// - `Concurrency(ConcurrentWrite)` when the table reports a conflict
    pub fn add_document(
        &self,
        key: &str,
        expected_etag: Option<Etag>,
        data: Value,
        metadata: Metadata,
    ) -> Result<AddDocumentResult> {
        self.limits.validate_key(key)?;

        let existing = self.table.seek_key(key)?;
        match (&existing, expected_etag) {
            (Some(row), Some(expected)) if row.etag != expected => {
                return Err(ConcurrencyError::etag_mismatch(key, OP_PUT, expected, row.etag).into());
            }
            (None, Some(expected)) if !expected.is_empty() => {
                return Err(ConcurrencyError {
                    expected: Some(expected),
                    ..ConcurrencyError::new(ConcurrencyKind::UnexpectedEtagOnCreate, key, OP_PUT)
                }
                .into());
            }
            _ => {}
        }

        let prev_etag = existing.as_ref().map(|row| row.etag);
        self.write(key, prev_etag, &data, &metadata, OP_PUT)
    }

    /// Write a document without an etag check
    ///
    /// With `overwrite_existing` an existing document is replaced. Without
    /// it the key is not looked up and a plain insert is issued, so an
    /// existing key fails with `Concurrency(ConcurrentWrite)`.
    pub fn insert_document(
        &self,
        key: &str,
        data: Value,
        metadata: Metadata,
        overwrite_existing: bool,
    ) -> Result<AddDocumentResult> {
        self.limits.validate_key(key)?;

        let prev_etag = if overwrite_existing {
            self.table.seek_key(key)?.map(|row| row.etag)
        } else {
            None
        };
        self.write(key, prev_etag, &data, &metadata, OP_INSERT)
    }

    fn write(
        &self,
        key: &str,
        prev_etag: Option<Etag>,
        data: &Value,
        metadata: &Metadata,
        operation: &'static str,
    ) -> Result<AddDocumentResult> {
        let encoded = self.codecs.encode(key, data, metadata)?;
        let metadata_bytes = serde_json::to_vec(metadata)?;
        let saved_at = Utc::now();

        // The table stamps the etag while the row is locked
        let row = StoredDocument {
            key: key.to_string(),
            etag: Etag::EMPTY,
            last_modified: saved_at,
            data: encoded,
            metadata: metadata_bytes,
        };

        let etag = match prev_etag {
            Some(prev) => {
                let etag = self
                    .table
                    .replace_stamped(key, &prev, row, self.etags.as_ref())
                    .map_err(|e| conflict(e, ConcurrencyKind::ConcurrentWrite, key, operation))?;
                debug!(target: "docstore::documents", key, %etag, prev = %prev, "Updated document");
                etag
            }
            None => {
                let etag = self
                    .table
                    .insert_stamped(row, self.etags.as_ref())
                    .map_err(|e| conflict(e, ConcurrencyKind::ConcurrentWrite, key, operation))?;
                self.table.increment_document_count(1);
                debug!(target: "docstore::documents", key, %etag, "Inserted new document");
                etag
            }
        };

        self.cache.remove(key, &etag);

        Ok(AddDocumentResult {
            etag,
            prev_etag,
            saved_at,
            updated: prev_etag.is_some(),
        })
    }

    /// Delete a document
    ///
    /// Returns `None` when no document exists for `key`.
    ///
    /// # Errors
    ///
    /// - `Concurrency(EtagMismatch)` when `expected_etag` differs from the
    ///   stored etag
    /// - `Concurrency(ConcurrentWrite)` when the table reports a conflict
    pub fn delete_document(
        &self,
        key: &str,
        expected_etag: Option<Etag>,
    ) -> Result<Option<DeletedDocument>> {
        let row = match self.table.seek_key(key)? {
            Some(row) => row,
            None => {
                debug!(target: "docstore::documents", key, "Document was not found");
                return Ok(None);
            }
        };

        if let Some(expected) = expected_etag {
            if expected != row.etag {
                return Err(ConcurrencyError::etag_mismatch(key, OP_DELETE, expected, row.etag).into());
            }
        }

        let metadata = decode_metadata(&row.key, &row.metadata)?;
        self.table
            .delete(key, &row.etag)
            .map_err(|e| conflict(e, ConcurrencyKind::ConcurrentWrite, key, OP_DELETE))?;
        self.table.increment_document_count(-1);
        self.cache.remove(key, &row.etag);

        debug!(target: "docstore::documents", key, etag = %row.etag, "Document deleted");
        Ok(Some(DeletedDocument {
            metadata,
            etag: row.etag,
        }))
    }

    /// Rotate a document's etag without changing its content
    ///
    /// Data, metadata and `last_modified` are preserved. The (pre, post) pair
    /// is recorded in the touch ledger. Returns `None` when no document
    /// exists for `key`.
    ///
    /// # Errors
    ///
    /// `Concurrency(ConcurrentTouch)` when the document changed between the
    /// seek and the rewrite.
    pub fn touch(&self, key: &str) -> Result<Option<TouchResult>> {
        let row = match self.table.seek_key(key)? {
            Some(row) => row,
            None => {
                debug!(target: "docstore::documents", key, "Tried to touch a missing document");
                return Ok(None);
            }
        };

        let pre_etag = row.etag;
        let post_etag = self
            .table
            .replace_stamped(key, &pre_etag, row, self.etags.as_ref())
            .map_err(|e| conflict(e, ConcurrencyKind::ConcurrentTouch, key, OP_TOUCH))?;
        self.touches.record(pre_etag, post_etag);

        debug!(target: "docstore::documents", key, pre = %pre_etag, post = %post_etag, "Touched document");
        Ok(Some(TouchResult {
            pre_etag,
            post_etag,
        }))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Document for `key` (case-insensitive)
    pub fn document_by_key(&self, key: &str) -> Result<Option<Document>> {
        match self.table.seek_key(key)? {
            Some(row) => self.materialize(row).map(Some),
            None => {
                debug!(target: "docstore::documents", key, "Document was not found");
                Ok(None)
            }
        }
    }

    /// Metadata for `key` without decoding the body
    pub fn document_metadata_by_key(&self, key: &str) -> Result<Option<DocumentMetadata>> {
        let Some(row) = self.table.seek_key(key)? else {
            return Ok(None);
        };
        let metadata = match self.cache.get(&row.key, &row.etag) {
            Some(cached) => cached.metadata.clone(),
            None => decode_metadata(&row.key, &row.metadata)?,
        };
        Ok(Some(DocumentMetadata {
            key: row.key,
            etag: row.etag,
            metadata,
            last_modified: row.last_modified,
        }))
    }

    /// Stored body bytes for `key`, exactly as the codec pipeline wrote them
    pub fn raw_document_by_key(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.table.seek_key(key)?.map(|row| row.data))
    }

    /// Live document count
    pub fn documents_count(&self) -> u64 {
        self.table.document_count()
    }

    /// Etag of the first document written after `etag`, or `etag` itself
    pub fn best_next_document_etag(&self, etag: Etag) -> Result<Etag> {
        Ok(self
            .table
            .next_by_etag(&etag)?
            .map(|row| row.etag)
            .unwrap_or(etag))
    }

    /// Touch ledger shared by every touch on this store
    pub fn touches(&self) -> &EtagTouchLedger {
        &self.touches
    }

    /// Codec pipeline applied to document bodies
    pub fn codecs(&self) -> &CodecPipeline {
        &self.codecs
    }

    /// Turn a stored row into a document, going through the cache
    pub(crate) fn materialize(&self, row: StoredDocument) -> Result<Document> {
        let serialized_size_on_disk = row.size_on_disk();

        let (data, metadata) = match self.cache.get(&row.key, &row.etag) {
            Some(cached) => (cached.data.clone(), cached.metadata.clone()),
            None => {
                let metadata = decode_metadata(&row.key, &row.metadata)?;
                let data = self.codecs.decode(&row.key, &metadata, &row.data)?;
                self.cache.set(
                    &row.key,
                    &row.etag,
                    data.clone(),
                    metadata.clone(),
                    serialized_size_on_disk as usize,
                );
                (data, metadata)
            }
        };

        Ok(Document {
            key: row.key,
            etag: row.etag,
            data,
            metadata,
            last_modified: row.last_modified,
            serialized_size_on_disk,
        })
    }
}

pub(crate) fn decode_metadata(key: &str, bytes: &[u8]) -> Result<Metadata> {
    serde_json::from_slice(bytes).map_err(|e| Error::corruption(key, e))
}

/// Map table conflicts to the concurrency error of `kind`; other failures pass through
fn conflict(error: TableError, kind: ConcurrencyKind, key: &str, operation: &'static str) -> Error {
    match error {
        TableError::KeyDuplicate(_) | TableError::WriteConflict(_) => {
            ConcurrencyError::new(kind, key, operation).into()
        }
        other => other.into(),
    }
}
