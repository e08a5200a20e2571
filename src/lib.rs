//! docstore - document storage layer
//!
//! Maps string keys to JSON documents plus metadata, versions every write
//! with a globally increasing etag, and serves etag-ordered and key-ordered
//! scans for replication, indexing and client polling.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstore::{DocumentStore, MemoryTable, Metadata, ScanOptions, Etag};
//! use serde_json::json;
//!
//! let store = DocumentStore::builder(Arc::new(MemoryTable::new())).build()?;
//!
//! let put = store.add_document("users/1", None, json!({"name": "Ayende"}), Metadata::new())?;
//! let doc = store.document_by_key("USERS/1")?.unwrap();
//! assert_eq!(doc.etag, put.etag);
//!
//! for doc in store.scan_after(Etag::EMPTY, ScanOptions::new(100)) {
//!     println!("{} {}", doc?.key, put.etag);
//! }
//! ```
//!
//! # Architecture
//!
//! - `docstore-core`: etags, document types, key rules, errors
//! - `docstore-storage`: ordered table adapter, codecs, document cache
//! - `docstore-engine`: the document store, scans, stats and configuration

pub use docstore_core::*;
pub use docstore_engine::*;
pub use docstore_storage::{
    get_codec, CacheStats, CachedDocument, CodecError, CodecPipeline, CompressionCodec,
    DocumentCache, DocumentCodec, DocumentTable, IdentityCodec, KeySeek, MemoryDocumentCache,
    MemoryTable, NoopCache, StoredDocument, TableError, TableResult,
};
