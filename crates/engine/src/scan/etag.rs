//! Bounded etag-ordered enumeration
//!
//! [`EtagScan`] walks the by_etag index forward from a starting etag and
//! yields documents until one of its limits trips. Limits are checked per
//! candidate in this order:
//!
//! 1. cancellation: yields `Err(Canceled)` once and ends
//! 2. timeout: ends with early-exit set once the elapsed time exceeds it
//! 3. until-etag: ends once at least one document was emitted and the next
//!    candidate is past it
//! 4. id prefix: candidates whose key does not match are skipped (they still
//!    count as considered)
//! 5. size and count: checked after each emitted document
//!
//! The scan is forward-only and cannot be restarted. Its only resume state is
//! the last considered etag, reported through [`EtagScan::last_processed`] and
//! the `on_last_processed` callback.

use std::time::{Duration, Instant};

use docstore_core::limits::starts_with_ignore_case;
use docstore_core::{CancellationToken, Document, Error, Etag, Result};
use tracing::debug;

use crate::store::DocumentStore;

/// Limits for an etag-ordered scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Only emit documents whose key starts with this (case-insensitive)
    pub id_prefix: Option<String>,
    /// Maximum number of documents emitted
    pub take: usize,
    /// Cooperative cancellation
    pub cancel: CancellationToken,
    /// Stop once the emitted on-disk size exceeds this many bytes
    pub max_total_size: Option<u64>,
    /// Stop before the first candidate past this etag (after one emit)
    pub until_etag: Option<Etag>,
    /// Stop once this much time has elapsed
    pub timeout: Option<Duration>,
}

impl ScanOptions {
    /// Options emitting at most `take` documents and no other limit
    pub fn new(take: usize) -> Self {
        Self {
            take,
            ..Self::default()
        }
    }

    /// Restrict to keys starting with `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Observe `cancel`
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop once emitted documents exceed `bytes` on disk
    pub fn with_max_total_size(mut self, bytes: u64) -> Self {
        self.max_total_size = Some(bytes);
        self
    }

    /// Stop past `etag`
    pub fn with_until_etag(mut self, etag: Etag) -> Self {
        self.until_etag = Some(etag);
        self
    }

    /// Stop after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

type LastProcessedCallback<'a> = Box<dyn FnOnce(Option<Etag>) + 'a>;

/// Lazy etag-ordered document iterator
///
/// Created by [`DocumentStore::scan_after`]. The `on_last_processed`
/// callback fires once when the scan ends on its own; it does not fire when
/// the scan is canceled, fails, or is dropped before the end.
pub struct EtagScan<'a> {
    store: &'a DocumentStore,
    options: ScanOptions,
    position: Etag,
    last_processed: Option<Etag>,
    emitted: usize,
    total_size: u64,
    started: Instant,
    early_exit: bool,
    done: bool,
    on_last_processed: Option<LastProcessedCallback<'a>>,
}

impl<'a> EtagScan<'a> {
    pub(crate) fn new(store: &'a DocumentStore, after: Etag, options: ScanOptions) -> Self {
        Self {
            store,
            options,
            position: after,
            last_processed: None,
            emitted: 0,
            total_size: 0,
            started: Instant::now(),
            early_exit: false,
            done: false,
            on_last_processed: None,
        }
    }

    /// Call `callback` with the last considered etag when the scan ends
    pub fn on_last_processed(mut self, callback: impl FnOnce(Option<Etag>) + 'a) -> Self {
        self.on_last_processed = Some(Box::new(callback));
        self
    }

    /// Whether the scan stopped because a limit tripped rather than because
    /// the index ran out
    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    /// Etag of the last candidate considered (emitted or skipped by prefix)
    pub fn last_processed(&self) -> Option<Etag> {
        self.last_processed
    }

    /// Number of documents emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn finish(&mut self) {
        self.done = true;
        debug!(
            target: "docstore::scan",
            emitted = self.emitted,
            total_size = self.total_size,
            early_exit = self.early_exit,
            "Etag scan finished"
        );
        if let Some(callback) = self.on_last_processed.take() {
            callback(self.last_processed);
        }
    }

    fn abort(&mut self, error: Error) -> Option<Result<Document>> {
        self.done = true;
        self.on_last_processed = None;
        Some(Err(error))
    }

    fn limits_reached(&self) -> bool {
        let over_size = self
            .options
            .max_total_size
            .map_or(false, |max| self.total_size > max);
        over_size || self.emitted >= self.options.take
    }
}

impl Iterator for EtagScan<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.options.take == 0 {
            self.finish();
            return None;
        }

        loop {
            if self.options.cancel.is_canceled() {
                return self.abort(Error::Canceled);
            }

            if let Some(timeout) = self.options.timeout {
                if self.started.elapsed() > timeout {
                    self.early_exit = true;
                    self.finish();
                    return None;
                }
            }

            let row = match self.store.table.next_by_etag(&self.position) {
                Ok(Some(row)) => row,
                Ok(None) => {
                    self.finish();
                    return None;
                }
                Err(e) => return self.abort(e.into()),
            };

            if let Some(until) = self.options.until_etag {
                if self.emitted > 0 && row.etag.is_greater_than(&until) {
                    self.finish();
                    return None;
                }
            }

            self.position = row.etag;
            self.last_processed = Some(row.etag);

            if let Some(prefix) = &self.options.id_prefix {
                if !starts_with_ignore_case(&row.key, prefix) {
                    continue;
                }
            }

            let size = row.size_on_disk();
            let document = match self.store.materialize(row) {
                Ok(document) => document,
                Err(e) => return self.abort(e),
            };
            self.emitted += 1;
            self.total_size += size;

            if self.limits_reached() {
                if self.options.until_etag.is_some() {
                    self.early_exit = true;
                }
                self.finish();
            }
            return Some(Ok(document));
        }
    }
}

impl DocumentStore {
    /// Documents written after `etag`, in etag order, within `options`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut scan = store
    ///     .scan_after(last_seen, ScanOptions::new(128).with_max_total_size(1 << 20))
    ///     .on_last_processed(|etag| checkpoint = etag);
    /// for document in &mut scan {
    ///     index(document?);
    /// }
    /// ```
    pub fn scan_after(&self, etag: Etag, options: ScanOptions) -> EtagScan<'_> {
        EtagScan::new(self, etag, options)
    }

    /// Up to `take` documents written after `etag`
    pub fn documents_after(&self, etag: Etag, take: usize, cancel: CancellationToken) -> EtagScan<'_> {
        self.scan_after(etag, ScanOptions::new(take).with_cancel(cancel))
    }
}
