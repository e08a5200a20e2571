//! Document types
//!
//! A document is a JSON body plus a JSON metadata object, addressed by a
//! string key and versioned by an [`Etag`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::etag::Etag;

/// Document metadata: a JSON object stored beside the body
pub type Metadata = Map<String, Value>;

/// Metadata entry naming the collection a document belongs to
pub const COLLECTION_METADATA_KEY: &str = "Docstore-Entity-Name";

/// Metadata entry marking a document as a tombstone written by an upper layer
pub const DELETE_MARKER_METADATA_KEY: &str = "Docstore-Delete-Marker";

/// A stored document as returned by reads and scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Key, case as written
    pub key: String,
    /// Etag of the last write
    pub etag: Etag,
    /// Body
    pub data: Value,
    /// Metadata
    pub metadata: Metadata,
    /// Time of the last content write (touch does not change it)
    pub last_modified: DateTime<Utc>,
    /// Stored metadata bytes plus stored (encoded) body bytes
    pub serialized_size_on_disk: u64,
}

impl Document {
    /// Collection name from metadata, if any
    pub fn collection(&self) -> Option<&str> {
        collection_of(&self.metadata)
    }
}

/// Document metadata without the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Key, case as written
    pub key: String,
    /// Etag of the last write
    pub etag: Etag,
    /// Metadata
    pub metadata: Metadata,
    /// Time of the last content write
    pub last_modified: DateTime<Utc>,
}

/// Collection name carried in a metadata object
pub fn collection_of(metadata: &Metadata) -> Option<&str> {
    metadata
        .get(COLLECTION_METADATA_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Result of a successful add or insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddDocumentResult {
    /// Etag assigned by this write
    pub etag: Etag,
    /// Etag that was replaced, when the write updated an existing document
    pub prev_etag: Option<Etag>,
    /// Time stamped on the document
    pub saved_at: DateTime<Utc>,
    /// Whether an existing document was updated
    pub updated: bool,
}

/// What a successful delete removed
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedDocument {
    /// Metadata of the removed document
    pub metadata: Metadata,
    /// Etag of the removed document
    pub etag: Etag,
}

/// Etags before and after a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchResult {
    /// Etag before the touch
    pub pre_etag: Etag,
    /// Etag assigned by the touch
    pub post_etag: Etag,
}
