//! Etag: the global version marker of a document
//!
//! Every successful write assigns a fresh etag. Etags are totally ordered and
//! the order is the single source of truth for "what changed and when" across
//! all keys.
//!
//! ## Layout
//!
//! An etag is two u64 halves:
//!
//! - `restarts`: fixed for the lifetime of a generator (bumped across process
//!   restarts so etags from different runs never collide)
//! - `changes`: incremented for every write
//!
//! The sortable form is the 16 bytes `restarts || changes`, both big-endian.
//! Lexicographic byte order of the sortable form equals etag order, which is
//! what lets the by_etag index use it directly as an index key.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the sortable byte form.
pub const ETAG_SIZE: usize = 16;

/// Globally unique, totally ordered document version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Etag {
    restarts: u64,
    changes: u64,
}

/// Errors from parsing an etag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EtagParseError {
    /// Byte form had the wrong length
    #[error("Etag must be 16 bytes, got {0}")]
    InvalidLength(usize),

    /// Text form was not 32 hex digits
    #[error("Invalid etag text: {0}")]
    InvalidText(String),
}

impl Etag {
    /// The etag of "no document yet".
    pub const EMPTY: Etag = Etag {
        restarts: 0,
        changes: 0,
    };

    /// Create an etag from its two halves
    pub const fn new(restarts: u64, changes: u64) -> Self {
        Etag { restarts, changes }
    }

    /// Restart component
    #[inline]
    pub const fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Change counter component
    #[inline]
    pub const fn changes(&self) -> u64 {
        self.changes
    }

    /// Whether this is [`Etag::EMPTY`]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.restarts == 0 && self.changes == 0
    }

    /// Strict "newer than" comparison
    #[inline]
    pub fn is_greater_than(&self, other: &Etag) -> bool {
        self > other
    }

    /// Etag `n` changes later, saturating at the end of the restart
    pub const fn increment_by(&self, n: u64) -> Self {
        Etag {
            restarts: self.restarts,
            changes: self.changes.saturating_add(n),
        }
    }

    /// Sort-order-preserving byte form used as the by_etag index key
    pub fn to_sortable_bytes(&self) -> [u8; ETAG_SIZE] {
        let mut out = [0u8; ETAG_SIZE];
        let mut cursor = Cursor::new(&mut out[..]);
        // Writing 16 bytes into a 16-byte buffer cannot fail.
        let _ = cursor.write_u64::<BigEndian>(self.restarts);
        let _ = cursor.write_u64::<BigEndian>(self.changes);
        out
    }

    /// Parse the sortable byte form
    pub fn from_sortable_bytes(bytes: &[u8]) -> Result<Self, EtagParseError> {
        if bytes.len() != ETAG_SIZE {
            return Err(EtagParseError::InvalidLength(bytes.len()));
        }
        let mut cursor = Cursor::new(bytes);
        let restarts = cursor
            .read_u64::<BigEndian>()
            .map_err(|_| EtagParseError::InvalidLength(bytes.len()))?;
        let changes = cursor
            .read_u64::<BigEndian>()
            .map_err(|_| EtagParseError::InvalidLength(bytes.len()))?;
        Ok(Etag { restarts, changes })
    }
}

impl Default for Etag {
    fn default() -> Self {
        Etag::EMPTY
    }
}

impl fmt::Display for Etag {
    /// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` over the sortable bytes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_sortable_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl FromStr for Etag {
    type Err = EtagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != ETAG_SIZE * 2 || !hex.is_ascii() {
            return Err(EtagParseError::InvalidText(s.to_string()));
        }
        let mut bytes = [0u8; ETAG_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| EtagParseError::InvalidText(s.to_string()))?;
        }
        Etag::from_sortable_bytes(&bytes)
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Source of fresh etags
///
/// Shared by every writer of a store. Implementations must hand out etags that
/// are unique and strictly increasing regardless of which key is written.
pub trait EtagGenerator: Send + Sync {
    /// Allocate the next etag
    fn next_etag(&self) -> Etag;
}

/// Generator backed by an atomic change counter
///
/// Uses fetch_add so concurrent writers never receive the same etag and
/// etags come out in allocation order.
#[derive(Debug)]
pub struct SequentialEtagGenerator {
    restarts: u64,
    changes: AtomicU64,
}

impl SequentialEtagGenerator {
    /// Start a generator at `restarts`, with the first etag having `changes == 1`
    pub fn new(restarts: u64) -> Self {
        Self {
            restarts,
            changes: AtomicU64::new(0),
        }
    }

    /// Continue strictly after a previously issued etag
    pub fn resume_after(last: Etag) -> Self {
        Self {
            restarts: last.restarts(),
            changes: AtomicU64::new(last.changes()),
        }
    }

    /// The most recently issued etag (`changes == 0` before the first allocation)
    pub fn current(&self) -> Etag {
        Etag::new(self.restarts, self.changes.load(Ordering::SeqCst))
    }
}

impl Default for SequentialEtagGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl EtagGenerator for SequentialEtagGenerator {
    fn next_etag(&self) -> Etag {
        let changes = self.changes.fetch_add(1, Ordering::SeqCst) + 1;
        Etag::new(self.restarts, changes)
    }
}
