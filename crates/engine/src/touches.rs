//! Etag touch ledger
//!
//! Every touch rotates a document's etag without changing its content. The
//! ledger remembers which etag replaced which, so consumers holding a
//! pre-touch etag can find where the document moved to.
//!
//! The ledger is bounded: once `capacity` entries are held, the oldest entry
//! is evicted for each new one.

use std::collections::VecDeque;

use docstore_core::Etag;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Default number of touches remembered
pub const DEFAULT_TOUCH_LEDGER_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Default)]
struct LedgerInner {
    post_by_pre: FxHashMap<Etag, Etag>,
    order: VecDeque<Etag>,
}

/// Bounded map of pre-touch etag to post-touch etag
#[derive(Debug)]
pub struct EtagTouchLedger {
    inner: Mutex<LedgerInner>,
    capacity: usize,
}

impl EtagTouchLedger {
    /// Create a ledger holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
            capacity,
        }
    }

    /// Record that `pre` was replaced by `post`
    pub fn record(&self, pre: Etag, post: Etag) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.post_by_pre.remove(&oldest);
                }
                None => break,
            }
        }
        if inner.post_by_pre.insert(pre, post).is_none() {
            inner.order.push_back(pre);
        }
    }

    /// Etag that directly replaced `pre`, if remembered
    pub fn get(&self, pre: &Etag) -> Option<Etag> {
        self.inner.lock().post_by_pre.get(pre).copied()
    }

    /// Follow touches from `etag` to the most recent etag remembered
    ///
    /// Returns `etag` itself when it was never touched.
    pub fn resolve(&self, etag: Etag) -> Etag {
        let inner = self.inner.lock();
        let mut current = etag;
        // At most one step per entry held.
        for _ in 0..=inner.order.len() {
            match inner.post_by_pre.get(&current) {
                Some(next) if next.is_greater_than(&current) => current = *next,
                _ => break,
            }
        }
        current
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries held
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EtagTouchLedger {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_LEDGER_CAPACITY)
    }
}
