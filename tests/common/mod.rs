//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

pub use docstore::{
    CancellationToken, ConcurrencyKind, Document, DocumentStore, DocumentTable, Error, Etag,
    EtagGenerator, MemoryTable, Metadata, ScanOptions, StoreConfig, COLLECTION_METADATA_KEY,
};
pub use serde_json::{json, Value};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` warnings through the test harness
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::WARN)
            .try_init();
    });
}

// ============================================================================
// TestStore - store over a fresh in-memory table
// ============================================================================

/// Store plus direct access to its table
pub struct TestStore {
    pub store: DocumentStore,
    pub table: Arc<MemoryTable>,
}

impl TestStore {
    /// Store with default configuration
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Store with compression on
    pub fn compressed() -> Self {
        Self::with_config(&StoreConfig {
            compression: true,
            ..StoreConfig::default()
        })
    }

    /// Store built from `config`
    pub fn with_config(config: &StoreConfig) -> Self {
        init_tracing();
        let table = Arc::new(MemoryTable::new());
        let store = DocumentStore::from_config(Arc::clone(&table) as Arc<dyn DocumentTable>, config)
            .expect("store from config");
        Self { store, table }
    }

    /// Add `key` with a small body and no metadata
    pub fn put(&self, key: &str) -> Etag {
        self.store
            .add_document(key, None, json!({ "id": key }), Metadata::new())
            .expect("add document")
            .etag
    }

    /// Add `key` tagged with `collection`
    pub fn put_in(&self, key: &str, collection: &str) -> Etag {
        self.store
            .add_document(key, None, json!({ "id": key }), collection_metadata(collection))
            .expect("add document")
            .etag
    }

    /// Keys of a fully drained etag scan
    pub fn scan_keys(&self, after: Etag, options: ScanOptions) -> Vec<String> {
        self.store
            .scan_after(after, options)
            .map(|d| d.expect("scan document").key)
            .collect()
    }
}

/// Metadata naming a collection
pub fn collection_metadata(collection: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(COLLECTION_METADATA_KEY.to_string(), json!(collection));
    metadata
}

/// Generator handing out etags from a fixed restarts value, starting at 1000
pub struct FixedRestartsGenerator {
    restarts: u64,
    changes: AtomicU64,
}

impl FixedRestartsGenerator {
    pub fn new(restarts: u64) -> Self {
        Self {
            restarts,
            changes: AtomicU64::new(999),
        }
    }
}

impl EtagGenerator for FixedRestartsGenerator {
    fn next_etag(&self) -> Etag {
        Etag::new(self.restarts, self.changes.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
