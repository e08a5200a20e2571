//! Scans over the documents table
//!
//! - [`EtagScan`]: bounded forward walk of by_etag
//! - [`PrefixScan`]: key-range walk of by_key
//! - `etag_after_skip`: resolve the etag `take` documents ahead
//! - `documents_by_reverse_update_order`: newest documents first

mod etag;
mod prefix;

pub use etag::{EtagScan, ScanOptions};
pub use prefix::PrefixScan;

use docstore_core::{CancellationToken, Document, Etag, Result};

use crate::store::DocumentStore;

impl DocumentStore {
    /// Etag reached by moving `take` documents past the first one written
    /// after `etag`
    ///
    /// With `take == 0` this is the first document after `etag`. Returns
    /// `etag` unchanged when nothing was written after it. When the move would
    /// pass the newest document, returns the newest document's etag.
    /// Cancellation is checked while stepping to the end.
    pub fn etag_after_skip(
        &self,
        etag: Etag,
        take: usize,
        cancel: &CancellationToken,
    ) -> Result<Etag> {
        let first = match self.table.next_by_etag(&etag)? {
            Some(row) => row.etag,
            None => return Ok(etag),
        };

        let offset = isize::try_from(take).unwrap_or(isize::MAX);
        if let Some(landed) = self.table.move_by_etag(&first, offset)? {
            return Ok(landed);
        }

        let mut last = first;
        while let Some(row) = self.table.next_by_etag(&last)? {
            cancel.check()?;
            last = row.etag;
        }
        Ok(last)
    }

    /// Newest documents first, skipping the `start` newest
    pub fn documents_by_reverse_update_order(
        &self,
        start: usize,
        take: usize,
    ) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(take.min(1024));
        if take == 0 {
            return Ok(documents);
        }

        let mut skipped = 0;
        let mut current = self.table.last_by_etag()?;
        while let Some(row) = current {
            current = self.table.prev_by_etag(&row.etag)?;
            if skipped < start {
                skipped += 1;
                continue;
            }
            documents.push(self.materialize(row)?);
            if documents.len() >= take {
                break;
            }
        }
        Ok(documents)
    }
}
