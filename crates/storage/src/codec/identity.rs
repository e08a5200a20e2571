//! Identity codec (no transformation).

use docstore_core::Metadata;
use serde_json::Value;

use super::traits::{CodecError, DocumentCodec};

/// Identity codec - no transformation.
///
/// Bytes pass through unchanged. Useful as a placeholder in configured
/// pipelines and as the neutral element in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl IdentityCodec {
    /// Codec identifier
    pub const ID: &'static str = "identity";
}

impl DocumentCodec for IdentityCodec {
    fn encode(
        &self,
        _key: &str,
        _data: &Value,
        _metadata: &Metadata,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(bytes)
    }

    fn decode(&self, _key: &str, _metadata: &Metadata, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(bytes)
    }

    fn codec_id(&self) -> &str {
        Self::ID
    }
}
