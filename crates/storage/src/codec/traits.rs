//! Document codec trait definitions.

use docstore_core::Metadata;
use serde_json::Value;

/// Document codec trait.
///
/// A codec is one reversible byte transform applied to document bodies
/// (compression, encryption). Codecs are chained by a
/// [`CodecPipeline`](super::CodecPipeline); metadata is never encoded, but it
/// is handed to every codec so a codec can make per-document decisions.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` to allow concurrent encoding/decoding
/// from multiple threads.
pub trait DocumentCodec: Send + Sync {
    /// Encode body bytes for storage.
    ///
    /// `data` is the document body the bytes were serialized from.
    fn encode(
        &self,
        key: &str,
        data: &Value,
        metadata: &Metadata,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode stored bytes.
    ///
    /// Reverses `encode`. Returns an error if the bytes cannot be decoded
    /// (e.g., decompression failure, corruption).
    fn decode(&self, key: &str, metadata: &Metadata, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Unique codec identifier used in configuration.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Decoding failed (e.g., decompression failure, invalid format).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Unknown codec identifier.
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}
