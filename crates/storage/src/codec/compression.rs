//! Compression codec (zstd).
//!
//! Encoded bodies are plain zstd frames, so every compressed payload starts
//! with the zstd frame magic. The pipeline uses that marker to tell "this
//! document is compressed but compression is not enabled" apart from generic
//! corruption.

use docstore_core::Metadata;
use serde_json::Value;

use super::traits::{CodecError, DocumentCodec};

/// Leading bytes of every compressed body (zstd frame magic, little-endian)
pub const COMPRESSED_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// zstd compression codec.
///
/// Decoding bytes that do not carry [`COMPRESSED_MAGIC`] passes them through
/// unchanged, so documents written before compression was enabled stay
/// readable.
#[derive(Debug, Clone, Copy)]
pub struct CompressionCodec {
    level: i32,
}

impl CompressionCodec {
    /// Codec identifier
    pub const ID: &'static str = "zstd";

    /// Create a codec with the given zstd level
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    /// Configured compression level
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for CompressionCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

/// Whether `bytes` start with the compressed-body marker
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.starts_with(&COMPRESSED_MAGIC)
}

impl DocumentCodec for CompressionCodec {
    fn encode(
        &self,
        key: &str,
        _data: &Value,
        _metadata: &Metadata,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, CodecError> {
        zstd::encode_all(bytes.as_slice(), self.level)
            .map_err(|e| CodecError::EncodeError(format!("compressing '{}': {}", key, e)))
    }

    fn decode(&self, key: &str, _metadata: &Metadata, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        if !is_compressed(&bytes) {
            return Ok(bytes);
        }
        zstd::decode_all(bytes.as_slice())
            .map_err(|e| CodecError::DecodeError(format!("decompressing '{}': {}", key, e)))
    }

    fn codec_id(&self) -> &str {
        Self::ID
    }
}
