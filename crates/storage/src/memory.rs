//! MemoryTable: in-process ordered table with by_key and by_etag indexes
//!
//! This module implements the [`DocumentTable`] contract using:
//! - `BTreeMap<IndexKey, StoredDocument>` as the by_key index (owns the rows)
//! - `BTreeMap<[u8; 16], IndexKey>` as the by_etag index, keyed by the etag's
//!   sortable bytes
//! - `parking_lot::RwLock` around both maps
//! - `AtomicI64` for the live document counter
//!
//! # Design Notes
//!
//! - **Both indexes under one lock**: every mutation updates the two maps under
//!   a single write lock acquisition, so no reader sees a row in one index and
//!   not the other.
//! - **Conflict detection by etag**: `replace` and `delete` compare the row's
//!   current etag with the one the caller read. A mismatch is reported as
//!   `WriteConflict`, standing in for the engine's native conflict detection.
//! - **Etags allocated under the lock**: the stamped mutations draw the new
//!   etag while holding the write lock, so rows appear on by_etag in
//!   allocation order and an etag checkpoint never skips a later commit.
//! - **Counter outside the lock**: the counter is an escrow column; writers
//!   update it with fetch_add and never take the table lock for it.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;

use docstore_core::limits::{collation_key, fold_case};
use docstore_core::{Etag, EtagGenerator, ETAG_SIZE};

use crate::table::{DocumentTable, KeySeek, StoredDocument, TableError, TableResult};

/// Position of a row in the by_key index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey {
    collation: String,
    folded: String,
}

impl IndexKey {
    fn for_key(key: &str) -> Self {
        IndexKey {
            collation: collation_key(key),
            folded: fold_case(key),
        }
    }

    /// Smallest position carrying the collation form of `text`
    fn lower_bound(text: &str) -> Self {
        IndexKey {
            collation: collation_key(text),
            folded: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Indexes {
    by_key: BTreeMap<IndexKey, StoredDocument>,
    by_etag: BTreeMap<[u8; ETAG_SIZE], IndexKey>,
}

impl Indexes {
    fn row_for_etag(&self, index_key: &IndexKey) -> TableResult<StoredDocument> {
        self.by_key.get(index_key).cloned().ok_or_else(|| {
            TableError::Engine(format!(
                "by_etag entry points at missing row '{}'",
                index_key.folded
            ))
        })
    }

    fn insert_row(&mut self, document: StoredDocument) -> TableResult<()> {
        let index_key = IndexKey::for_key(&document.key);
        let etag_bytes = document.etag.to_sortable_bytes();
        if self.by_key.contains_key(&index_key) || self.by_etag.contains_key(&etag_bytes) {
            return Err(TableError::KeyDuplicate(document.key));
        }
        self.by_etag.insert(etag_bytes, index_key.clone());
        self.by_key.insert(index_key, document);
        Ok(())
    }

    /// Stored etag of `key` if it still equals `expected_etag`
    fn current_etag(&self, key: &str, expected_etag: &Etag) -> TableResult<Etag> {
        match self.by_key.get(&IndexKey::for_key(key)) {
            Some(row) if row.etag == *expected_etag => Ok(row.etag),
            _ => Err(TableError::WriteConflict(key.to_string())),
        }
    }

    fn replace_row(
        &mut self,
        key: &str,
        expected_etag: &Etag,
        document: StoredDocument,
    ) -> TableResult<()> {
        let index_key = IndexKey::for_key(key);
        if IndexKey::for_key(&document.key) != index_key {
            return Err(TableError::Engine(format!(
                "replace of '{}' cannot move the row to key '{}'",
                key, document.key
            )));
        }
        let new_etag_bytes = document.etag.to_sortable_bytes();
        let old_etag = self.current_etag(key, expected_etag)?;
        if old_etag != document.etag && self.by_etag.contains_key(&new_etag_bytes) {
            return Err(TableError::KeyDuplicate(document.key));
        }
        self.by_etag.remove(&old_etag.to_sortable_bytes());
        self.by_etag.insert(new_etag_bytes, index_key.clone());
        self.by_key.insert(index_key, document);
        Ok(())
    }

    fn etag_entry(
        &self,
        entry: Option<(&[u8; ETAG_SIZE], &IndexKey)>,
    ) -> TableResult<Option<StoredDocument>> {
        match entry {
            Some((_, index_key)) => self.row_for_etag(index_key).map(Some),
            None => Ok(None),
        }
    }
}

/// In-memory ordered documents table
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicI64`.
#[derive(Debug, Default)]
pub struct MemoryTable {
    indexes: RwLock<Indexes>,
    document_count: AtomicI64,
}

impl MemoryTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows physically present
    ///
    /// Unlike [`DocumentTable::document_count`], this reads the index itself.
    pub fn len(&self) -> usize {
        self.indexes.read().by_key.len()
    }

    /// Whether the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentTable for MemoryTable {
    fn seek_key(&self, key: &str) -> TableResult<Option<StoredDocument>> {
        let indexes = self.indexes.read();
        Ok(indexes.by_key.get(&IndexKey::for_key(key)).cloned())
    }

    fn next_by_key(
        &self,
        seek: KeySeek<'_>,
        prefix: Option<&str>,
    ) -> TableResult<Option<StoredDocument>> {
        let lower = match seek {
            KeySeek::AtOrAfter(text) => Bound::Included(IndexKey::lower_bound(text)),
            KeySeek::After(key) => Bound::Excluded(IndexKey::for_key(key)),
        };
        let indexes = self.indexes.read();
        let next = indexes.by_key.range((lower, Bound::Unbounded)).next();
        let Some((index_key, row)) = next else {
            return Ok(None);
        };
        if let Some(prefix) = prefix {
            if !index_key.collation.starts_with(&collation_key(prefix)) {
                return Ok(None);
            }
        }
        Ok(Some(row.clone()))
    }

    fn next_by_etag(&self, after: &Etag) -> TableResult<Option<StoredDocument>> {
        let indexes = self.indexes.read();
        let entry = indexes
            .by_etag
            .range((Bound::Excluded(after.to_sortable_bytes()), Bound::Unbounded))
            .next();
        indexes.etag_entry(entry)
    }

    fn prev_by_etag(&self, before: &Etag) -> TableResult<Option<StoredDocument>> {
        let indexes = self.indexes.read();
        let entry = indexes
            .by_etag
            .range(..before.to_sortable_bytes())
            .next_back();
        indexes.etag_entry(entry)
    }

    fn first_by_etag(&self) -> TableResult<Option<StoredDocument>> {
        let indexes = self.indexes.read();
        let entry = indexes.by_etag.iter().next();
        indexes.etag_entry(entry)
    }

    fn last_by_etag(&self) -> TableResult<Option<StoredDocument>> {
        let indexes = self.indexes.read();
        let entry = indexes.by_etag.iter().next_back();
        indexes.etag_entry(entry)
    }

    fn move_by_etag(&self, from: &Etag, offset: isize) -> TableResult<Option<Etag>> {
        let indexes = self.indexes.read();
        let from_bytes = from.to_sortable_bytes();
        if !indexes.by_etag.contains_key(&from_bytes) {
            return Ok(None);
        }
        let landed = if offset >= 0 {
            indexes.by_etag.range(from_bytes..).nth(offset as usize)
        } else {
            indexes
                .by_etag
                .range(..=from_bytes)
                .rev()
                .nth(offset.unsigned_abs())
        };
        match landed {
            Some((_, index_key)) => Ok(Some(indexes.row_for_etag(index_key)?.etag)),
            None => Ok(None),
        }
    }

    fn insert(&self, document: StoredDocument) -> TableResult<()> {
        self.indexes.write().insert_row(document)
    }

    fn replace(
        &self,
        key: &str,
        expected_etag: &Etag,
        document: StoredDocument,
    ) -> TableResult<()> {
        self.indexes.write().replace_row(key, expected_etag, document)
    }

    fn delete(&self, key: &str, expected_etag: &Etag) -> TableResult<()> {
        let mut indexes = self.indexes.write();
        indexes.current_etag(key, expected_etag)?;
        indexes.by_key.remove(&IndexKey::for_key(key));
        indexes.by_etag.remove(&expected_etag.to_sortable_bytes());
        Ok(())
    }

    fn insert_stamped(
        &self,
        mut document: StoredDocument,
        etags: &dyn EtagGenerator,
    ) -> TableResult<Etag> {
        let mut indexes = self.indexes.write();
        // Refuse before drawing so a failed insert does not burn an etag
        if indexes.by_key.contains_key(&IndexKey::for_key(&document.key)) {
            return Err(TableError::KeyDuplicate(document.key));
        }
        document.etag = etags.next_etag();
        let etag = document.etag;
        indexes.insert_row(document)?;
        Ok(etag)
    }

    fn replace_stamped(
        &self,
        key: &str,
        expected_etag: &Etag,
        mut document: StoredDocument,
        etags: &dyn EtagGenerator,
    ) -> TableResult<Etag> {
        let mut indexes = self.indexes.write();
        indexes.current_etag(key, expected_etag)?;
        document.etag = etags.next_etag();
        let etag = document.etag;
        indexes.replace_row(key, expected_etag, document)?;
        Ok(etag)
    }

    fn increment_document_count(&self, delta: i64) {
        self.document_count.fetch_add(delta, Ordering::SeqCst);
    }

    fn document_count(&self) -> u64 {
        self.document_count.load(Ordering::SeqCst).max(0) as u64
    }
}
