//! Read-through document cache
//!
//! The store consults the cache before decoding a document and populates it
//! after a successful decode. Entries are keyed by (key, etag) and are never
//! mutated once stored: a newer write simply makes the old entry unreachable,
//! because lookups always name the etag they just read.
//!
//! # Implementations
//!
//! - [`MemoryDocumentCache`]: concurrent map bounded by entry count and
//!   approximate byte size
//! - [`NoopCache`]: caches nothing

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use docstore_core::limits::fold_case;
use docstore_core::{Etag, Metadata};
use serde_json::Value;

/// Decoded document held by a cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDocument {
    /// Decoded body
    pub data: Value,
    /// Decoded metadata
    pub metadata: Metadata,
}

/// Document cache plugin interface
///
/// Must be safe under concurrent access from multiple transactions.
pub trait DocumentCache: Send + Sync {
    /// Look up the decoded document for `key` at exactly `etag`
    fn get(&self, key: &str, etag: &Etag) -> Option<Arc<CachedDocument>>;

    /// Store a decoded document; `approx_size` is the stored byte size
    fn set(&self, key: &str, etag: &Etag, data: Value, metadata: Metadata, approx_size: usize);

    /// Drop the entry for `key` at `etag`, if any
    fn remove(&self, key: &str, etag: &Etag);
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl DocumentCache for NoopCache {
    fn get(&self, _key: &str, _etag: &Etag) -> Option<Arc<CachedDocument>> {
        None
    }

    fn set(&self, _key: &str, _etag: &Etag, _data: Value, _metadata: Metadata, _approx_size: usize) {}

    fn remove(&self, _key: &str, _etag: &Etag) {}
}

/// Cache statistics for observability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Approximate bytes currently held.
    pub size_bytes: usize,
}

#[derive(Debug)]
struct CacheEntry {
    document: Arc<CachedDocument>,
    size: usize,
}

/// Concurrent in-memory document cache
///
/// Bounded by `max_entries` and `max_size_bytes`. When an insert does not fit,
/// arbitrary entries are evicted until it does; a single document larger than
/// `max_size_bytes` is not cached at all.
#[derive(Debug)]
pub struct MemoryDocumentCache {
    entries: DashMap<(String, Etag), CacheEntry>,
    max_entries: usize,
    max_size_bytes: usize,
    size_bytes: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryDocumentCache {
    /// Create a cache with the given bounds
    pub fn new(max_entries: usize, max_size_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            max_size_bytes,
            size_bytes: AtomicUsize::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
            size_bytes: self.size_bytes.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
        self.size_bytes.store(0, Ordering::Relaxed);
    }

    fn cache_key(key: &str, etag: &Etag) -> (String, Etag) {
        (fold_case(key), *etag)
    }

    fn remove_entry(&self, cache_key: &(String, Etag)) {
        if let Some((_, entry)) = self.entries.remove(cache_key) {
            self.size_bytes.fetch_sub(entry.size, Ordering::Relaxed);
        }
    }

    fn make_room(&self, incoming: usize) {
        while self.entries.len() >= self.max_entries
            || self.size_bytes.load(Ordering::Relaxed) + incoming > self.max_size_bytes
        {
            // Take the key out of the iterator before removing: holding a shard
            // guard while removing from the same shard would deadlock.
            let victim = self.entries.iter().next().map(|e| e.key().clone());
            match victim {
                Some(victim) => self.remove_entry(&victim),
                None => break,
            }
        }
    }
}

impl Default for MemoryDocumentCache {
    fn default() -> Self {
        Self::new(4096, 64 * 1024 * 1024)
    }
}

impl DocumentCache for MemoryDocumentCache {
    fn get(&self, key: &str, etag: &Etag) -> Option<Arc<CachedDocument>> {
        let found = self
            .entries
            .get(&Self::cache_key(key, etag))
            .map(|entry| Arc::clone(&entry.document));
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    fn set(&self, key: &str, etag: &Etag, data: Value, metadata: Metadata, approx_size: usize) {
        if self.max_entries == 0 || approx_size > self.max_size_bytes {
            return;
        }
        let cache_key = Self::cache_key(key, etag);
        if self.entries.contains_key(&cache_key) {
            return;
        }
        self.make_room(approx_size);

        let entry = CacheEntry {
            document: Arc::new(CachedDocument { data, metadata }),
            size: approx_size,
        };
        if let Some(previous) = self.entries.insert(cache_key, entry) {
            // Lost a race with another writer of the same (key, etag).
            self.size_bytes.fetch_sub(previous.size, Ordering::Relaxed);
        }
        self.size_bytes.fetch_add(approx_size, Ordering::Relaxed);
    }

    fn remove(&self, key: &str, etag: &Etag) {
        self.remove_entry(&Self::cache_key(key, etag));
    }
}
