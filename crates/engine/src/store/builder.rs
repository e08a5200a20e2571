//! Builder for wiring a DocumentStore's collaborators

use std::sync::Arc;

use docstore_core::{Etag, EtagGenerator, KeyLimits, Result, SequentialEtagGenerator};
use docstore_storage::{
    get_codec, CodecPipeline, CompressionCodec, DocumentCache, DocumentCodec, DocumentTable,
    MemoryDocumentCache, NoopCache,
};
use tracing::info;

use super::config::StoreConfig;
use super::DocumentStore;
use crate::touches::{EtagTouchLedger, DEFAULT_TOUCH_LEDGER_CAPACITY};

/// Builder for [`DocumentStore`]
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use docstore_engine::DocumentStore;
/// use docstore_storage::{CompressionCodec, MemoryTable};
///
/// let store = DocumentStore::builder(Arc::new(MemoryTable::new()))
///     .codec(Arc::new(CompressionCodec::default()))
///     .touch_ledger_capacity(1024)
///     .build()?;
/// ```
///
/// Anything not set falls back to: no codecs, a default
/// [`MemoryDocumentCache`], and a [`SequentialEtagGenerator`] that continues
/// after the newest etag already in the table.
pub struct DocumentStoreBuilder {
    table: Arc<dyn DocumentTable>,
    codecs: Vec<Arc<dyn DocumentCodec>>,
    cache: Option<Arc<dyn DocumentCache>>,
    etags: Option<Arc<dyn EtagGenerator>>,
    etag_restarts: u64,
    touch_ledger_capacity: usize,
    limits: KeyLimits,
}

impl DocumentStoreBuilder {
    /// Create a builder over `table`
    pub fn new(table: Arc<dyn DocumentTable>) -> Self {
        Self {
            table,
            codecs: Vec::new(),
            cache: None,
            etags: None,
            etag_restarts: 1,
            touch_ledger_capacity: DEFAULT_TOUCH_LEDGER_CAPACITY,
            limits: KeyLimits::default(),
        }
    }

    /// Create a builder from configuration
    ///
    /// Fails if the configuration does not validate.
    pub fn from_config(table: Arc<dyn DocumentTable>, config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new(table)
            .etag_restarts(config.etag_restarts)
            .touch_ledger_capacity(config.touch_ledger_capacity);
        if config.compression {
            builder = builder.codec(Arc::new(CompressionCodec::new(config.compression_level)));
        }
        builder = if config.cache.enabled {
            builder.cache(Arc::new(MemoryDocumentCache::new(
                config.cache.max_entries,
                config.cache.max_size_bytes,
            )))
        } else {
            builder.no_cache()
        };
        Ok(builder)
    }

    /// Append a codec to the pipeline (applied after those already added)
    pub fn codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codecs.push(codec);
        self
    }

    /// Append a codec by identifier (`"identity"`, `"zstd"`)
    pub fn codec_by_id(self, codec_id: &str) -> Result<Self> {
        let codec = get_codec(codec_id)
            .map_err(|e| docstore_core::Error::InvalidConfig(e.to_string()))?;
        Ok(self.codec(codec))
    }

    /// Use this document cache
    pub fn cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disable document caching
    pub fn no_cache(self) -> Self {
        self.cache(Arc::new(NoopCache))
    }

    /// Use this etag generator instead of the default sequential one
    pub fn etag_generator(mut self, etags: Arc<dyn EtagGenerator>) -> Self {
        self.etags = Some(etags);
        self
    }

    /// `restarts` half for the default generator
    pub fn etag_restarts(mut self, restarts: u64) -> Self {
        self.etag_restarts = restarts;
        self
    }

    /// Number of touches the touch ledger remembers
    pub fn touch_ledger_capacity(mut self, capacity: usize) -> Self {
        self.touch_ledger_capacity = capacity;
        self
    }

    /// Key limits enforced on writes
    pub fn key_limits(mut self, limits: KeyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the store
    ///
    /// Reads the table once to find the newest etag when no generator was
    /// supplied.
    pub fn build(self) -> Result<DocumentStore> {
        let etags = match self.etags {
            Some(etags) => etags,
            None => {
                let newest = self.table.last_by_etag()?.map(|row| row.etag);
                Arc::new(default_generator(self.etag_restarts, newest)) as Arc<dyn EtagGenerator>
            }
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryDocumentCache::default()));
        let codecs = CodecPipeline::new(self.codecs);

        info!(
            target: "docstore::documents",
            codecs = ?codecs.codec_ids(),
            touch_ledger_capacity = self.touch_ledger_capacity,
            "Document store ready"
        );

        Ok(DocumentStore {
            table: self.table,
            codecs,
            cache,
            etags,
            touches: EtagTouchLedger::new(self.touch_ledger_capacity),
            limits: self.limits,
        })
    }
}

/// Generator for `restarts` that never reissues an etag at or below `newest`
fn default_generator(restarts: u64, newest: Option<Etag>) -> SequentialEtagGenerator {
    match newest {
        Some(newest) if !Etag::new(restarts, 0).is_greater_than(&newest) => {
            SequentialEtagGenerator::resume_after(newest)
        }
        _ => SequentialEtagGenerator::new(restarts),
    }
}
