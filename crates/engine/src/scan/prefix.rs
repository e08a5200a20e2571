//! Prefix key-range scan over by_key
//!
//! The by_key index orders keys by their collation form, so every key that can
//! match a prefix (exactly or with separators ignored) sits in one contiguous
//! range starting at the prefix's collation form.

use docstore_core::limits::{starts_with_ignore_case, starts_with_ignore_case_and_symbols};
use docstore_core::{Document, Result};
use docstore_storage::KeySeek;

use crate::store::DocumentStore;

/// Lazy by_key iterator over documents whose key starts with a prefix
///
/// Created by [`DocumentStore::scan_by_prefix`]. Ends at the first record in
/// the range that matches neither exactly nor relaxed.
pub struct PrefixScan<'a> {
    store: &'a DocumentStore,
    prefix: String,
    skip_after: Option<String>,
    position: Option<String>,
    to_skip: usize,
    remaining: usize,
    done: bool,
}

impl<'a> PrefixScan<'a> {
    fn new(
        store: &'a DocumentStore,
        prefix: &str,
        start: usize,
        take: usize,
        skip_after: Option<&str>,
    ) -> Self {
        Self {
            store,
            prefix: prefix.to_string(),
            skip_after: skip_after.map(str::to_string),
            position: None,
            to_skip: start,
            remaining: take,
            done: take == 0,
        }
    }

    fn matches(&self, key: &str) -> bool {
        starts_with_ignore_case(key, &self.prefix)
            || starts_with_ignore_case_and_symbols(key, &self.prefix)
    }
}

impl Iterator for PrefixScan<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.remaining > 0 {
            let seek = match (&self.position, &self.skip_after) {
                (Some(position), _) => KeySeek::After(position),
                (None, Some(skip_after)) => KeySeek::After(skip_after),
                (None, None) => KeySeek::AtOrAfter(&self.prefix),
            };
            let row = match self.store.table.next_by_key(seek, Some(&self.prefix)) {
                Ok(Some(row)) => row,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            self.position = Some(row.key.clone());

            if !self.matches(&row.key) {
                self.done = true;
                return None;
            }

            if self.to_skip > 0 {
                self.to_skip -= 1;
                continue;
            }

            self.remaining -= 1;
            return Some(self.store.materialize(row));
        }
        None
    }
}

impl DocumentStore {
    /// Documents whose key starts with `id_prefix`, in by_key order
    ///
    /// A key matches when it starts with the prefix ignoring case, or when it
    /// does so once symbols and punctuation are dropped from both
    /// (`"USERS-2"` matches `"Users/"`). With `skip_after`, the scan resumes
    /// after that key. `start` more matching records are skipped, then up to
    /// `take` are yielded.
    pub fn scan_by_prefix(
        &self,
        id_prefix: &str,
        start: usize,
        take: usize,
        skip_after: Option<&str>,
    ) -> PrefixScan<'_> {
        PrefixScan::new(self, id_prefix, start, take, skip_after)
    }
}
