//! Document codec abstraction.
//!
//! Document bodies pass through a [`CodecPipeline`] on their way to and from
//! the table. Metadata is stored raw and never goes through a codec.
//!
//! Available codecs:
//!
//! - `IdentityCodec` (`"identity"`): no transformation
//! - `CompressionCodec` (`"zstd"`): zstd compression
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstore_storage::codec::{CodecPipeline, CompressionCodec};
//!
//! let pipeline = CodecPipeline::new(vec![Arc::new(CompressionCodec::default())]);
//! let bytes = pipeline.encode("users/1", &data, &metadata)?;
//! let back = pipeline.decode("users/1", &metadata, &bytes)?;
//! assert_eq!(back, data);
//! ```

mod compression;
mod identity;
mod pipeline;
mod traits;

use std::sync::Arc;

pub use compression::{is_compressed, CompressionCodec, COMPRESSED_MAGIC, DEFAULT_COMPRESSION_LEVEL};
pub use identity::IdentityCodec;
pub use pipeline::CodecPipeline;
pub use traits::{CodecError, DocumentCodec};

/// Get a codec by its identifier.
///
/// Returns the codec if recognized, or an error for unknown codec IDs.
/// The compression codec is created with the default level.
///
/// # Known Codecs
///
/// - `"identity"`: No-op codec (pass-through)
/// - `"zstd"`: zstd compression
pub fn get_codec(codec_id: &str) -> Result<Arc<dyn DocumentCodec>, CodecError> {
    match codec_id {
        IdentityCodec::ID => Ok(Arc::new(IdentityCodec)),
        CompressionCodec::ID => Ok(Arc::new(CompressionCodec::default())),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}
