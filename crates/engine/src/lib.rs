//! Document engine for docstore
//!
//! This crate sits on top of the storage layer:
//! - DocumentStore: CRUD with optimistic concurrency, reads, touch
//! - Scans: etag-ordered, prefix key-range, reverse update order, skip-ahead
//! - EtagTouchLedger: pre-touch to post-touch etag map
//! - Diagnostics statistics
//! - StoreConfig: `docstore.toml` configuration
//!
//! The engine is the only component that knows about:
//! - Etag checks and their concurrency errors
//! - Codec, cache and generator wiring
//! - Scan limits and early-exit signalling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod scan;
pub mod stats;
pub mod store;
pub mod touches;

pub use scan::{EtagScan, PrefixScan, ScanOptions};
pub use stats::{CollectionStats, DocumentStats};
pub use store::{CacheConfig, DocumentStore, DocumentStoreBuilder, StoreConfig, CONFIG_FILE_NAME};
pub use touches::{EtagTouchLedger, DEFAULT_TOUCH_LEDGER_CAPACITY};
