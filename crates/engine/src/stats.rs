//! Diagnostics statistics
//!
//! `document_stats` makes one full pass over by_etag. It is meant for
//! diagnostics endpoints, not for anything on a hot path.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use docstore_core::limits::starts_with_ignore_case;
use docstore_core::{
    collection_of, CancellationToken, Etag, Result, DELETE_MARKER_METADATA_KEY, SYSTEM_KEY_PREFIX,
};
use serde::Serialize;
use tracing::info;

use crate::store::{decode_metadata, DocumentStore};

/// Per-group counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Documents in the group
    pub count: u64,
    /// Stored body bytes of the group
    pub total_size: u64,
    /// Key and stored body size of the largest document
    pub largest: Option<(String, u64)>,
}

impl CollectionStats {
    fn update(&mut self, key: &str, size: u64) {
        self.count += 1;
        self.total_size += size;
        let larger = match &self.largest {
            Some((_, largest)) => size > *largest,
            None => true,
        };
        if larger {
            self.largest = Some((key.to_string(), size));
        }
    }
}

/// Result of a full statistics pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentStats {
    /// Live document counter
    pub total: u64,
    /// Stored body bytes of every document
    pub total_size: u64,
    /// Documents whose key carries the system prefix
    pub system: CollectionStats,
    /// Documents without a collection name
    pub no_collection: CollectionStats,
    /// Documents per collection name
    pub collections: BTreeMap<String, CollectionStats>,
    /// Documents carrying the delete marker
    pub tombstones: u64,
    /// Time spent in the pass
    pub time_to_generate: Duration,
}

impl DocumentStore {
    /// Walk every document and aggregate sizes per collection
    ///
    /// `total` is the live counter, read before the pass; it is not
    /// linearizable with concurrent writes.
    pub fn document_stats(&self, cancel: &CancellationToken) -> Result<DocumentStats> {
        let started = Instant::now();
        let mut stats = DocumentStats {
            total: self.table.document_count(),
            ..DocumentStats::default()
        };

        let mut position = Etag::EMPTY;
        while let Some(row) = self.table.next_by_etag(&position)? {
            cancel.check()?;
            position = row.etag;

            let metadata = decode_metadata(&row.key, &row.metadata)?;
            let size = row.data.len() as u64;
            stats.total_size += size;

            if starts_with_ignore_case(&row.key, SYSTEM_KEY_PREFIX) {
                stats.system.update(&row.key, size);
            }

            match collection_of(&metadata) {
                Some(collection) => stats
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .update(&row.key, size),
                None => stats.no_collection.update(&row.key, size),
            }

            if metadata.contains_key(DELETE_MARKER_METADATA_KEY) {
                stats.tombstones += 1;
            }
        }

        stats.time_to_generate = started.elapsed();
        info!(
            target: "docstore::stats",
            total = stats.total,
            total_size = stats.total_size,
            collections = stats.collections.len(),
            elapsed_ms = stats.time_to_generate.as_millis() as u64,
            "Document stats generated"
        );
        Ok(stats)
    }
}
