//! Ordered chain of document codecs.
//!
//! Encoding is a left-to-right fold over the configured codecs; decoding runs
//! the same codecs right-to-left so that decode exactly undoes encode for any
//! pipeline length, including zero.

use std::fmt;
use std::sync::Arc;

use docstore_core::{BoxError, Error, Metadata, Result};
use serde_json::Value;
use tracing::warn;

use super::compression::{is_compressed, CompressionCodec};
use super::traits::DocumentCodec;

/// Immutable, ordered list of codecs applied to document bodies
#[derive(Clone, Default)]
pub struct CodecPipeline {
    codecs: Vec<Arc<dyn DocumentCodec>>,
}

impl CodecPipeline {
    /// Pipeline applying `codecs` in order on encode
    pub fn new(codecs: Vec<Arc<dyn DocumentCodec>>) -> Self {
        Self { codecs }
    }

    /// Pipeline with no codecs (bodies stored as plain JSON)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of codecs
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no codecs are installed
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Codec identifiers in encode order
    pub fn codec_ids(&self) -> Vec<&str> {
        self.codecs.iter().map(|c| c.codec_id()).collect()
    }

    /// Whether a codec with this id is installed
    pub fn contains(&self, codec_id: &str) -> bool {
        self.codecs.iter().any(|c| c.codec_id() == codec_id)
    }

    /// Serialize `data` and run it through every codec, first to last
    pub fn encode(&self, key: &str, data: &Value, metadata: &Metadata) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(data)?;
        self.codecs.iter().try_fold(bytes, |bytes, codec| {
            codec
                .encode(key, data, metadata, bytes)
                .map_err(|e| Error::Serialization(format!("document '{}': {}", key, e)))
        })
    }

    /// Run stored bytes through every codec, last to first, and parse the body
    ///
    /// Failures are classified: a body carrying the compressed marker while no
    /// compression codec is installed yields `MissingCodec`; anything else
    /// yields `DataCorruption`. Both carry the document key.
    pub fn decode(&self, key: &str, metadata: &Metadata, raw: &[u8]) -> Result<Value> {
        let decoded = self
            .codecs
            .iter()
            .rev()
            .try_fold(raw.to_vec(), |bytes, codec| {
                codec
                    .decode(key, metadata, bytes)
                    .map_err(|e| -> BoxError { Box::new(e) })
            })
            .and_then(|bytes| {
                serde_json::from_slice::<Value>(&bytes).map_err(|e| -> BoxError { Box::new(e) })
            });

        decoded.map_err(|source| self.classify_failure(key, raw, source))
    }

    fn classify_failure(&self, key: &str, raw: &[u8], source: BoxError) -> Error {
        if is_compressed(raw) && !self.contains(CompressionCodec::ID) {
            warn!(target: "docstore::codec", key, "Document is compressed but compression is not enabled");
            return Error::MissingCodec {
                key: key.to_string(),
                source,
            };
        }
        warn!(target: "docstore::codec", key, error = %source, "Failed to decode document");
        Error::DataCorruption {
            key: key.to_string(),
            source,
        }
    }
}

impl fmt::Debug for CodecPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecPipeline")
            .field("codecs", &self.codec_ids())
            .finish()
    }
}
