//! Storage layer for docstore
//!
//! This crate implements everything below the document store:
//! - DocumentTable: ordered-table adapter with by_key and by_etag indexes
//! - MemoryTable: BTreeMap-based table with RwLock
//! - Codec pipeline for document bodies (identity, zstd)
//! - Document cache plugin interface and a DashMap-backed implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod memory;
pub mod table;

pub use cache::{CacheStats, CachedDocument, DocumentCache, MemoryDocumentCache, NoopCache};
pub use codec::{get_codec, CodecError, CodecPipeline, CompressionCodec, DocumentCodec, IdentityCodec};
pub use memory::MemoryTable;
pub use table::{DocumentTable, KeySeek, StoredDocument, TableError, TableResult};
