//! Store configuration via `docstore.toml`
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! store: no compression, an in-memory document cache, and a touch ledger of
//! [`DEFAULT_TOUCH_LEDGER_CAPACITY`] entries.

use std::path::Path;

use docstore_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::touches::DEFAULT_TOUCH_LEDGER_CAPACITY;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "docstore.toml";

/// Valid zstd levels accepted in configuration
const COMPRESSION_LEVELS: std::ops::RangeInclusive<i32> = 1..=22;

/// Document cache settings, the `[cache]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache decoded documents (default: true)
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Maximum number of cached documents (default: 4096)
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    /// Maximum approximate cached bytes (default: 64 MiB)
    #[serde(default = "default_cache_max_size_bytes")]
    pub max_size_bytes: usize,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    4096
}

fn default_cache_max_size_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_cache_max_entries(),
            max_size_bytes: default_cache_max_size_bytes(),
        }
    }
}

/// Store configuration loaded from `docstore.toml`.
///
/// # Example
///
/// ```toml
/// compression = true
/// compression_level = 3
///
/// [cache]
/// max_entries = 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Compress document bodies with zstd
    #[serde(default)]
    pub compression: bool,
    /// zstd level used when compression is on
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Document cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Number of touches remembered by the touch ledger
    #[serde(default = "default_touch_ledger_capacity")]
    pub touch_ledger_capacity: usize,
    /// `restarts` half of every etag issued by this store
    #[serde(default = "default_etag_restarts")]
    pub etag_restarts: u64,
}

fn default_compression_level() -> i32 {
    3
}

fn default_touch_ledger_capacity() -> usize {
    DEFAULT_TOUCH_LEDGER_CAPACITY
}

fn default_etag_restarts() -> u64 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression: false,
            compression_level: default_compression_level(),
            cache: CacheConfig::default(),
            touch_ledger_capacity: default_touch_ledger_capacity(),
            etag_restarts: default_etag_restarts(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docstore configuration
#
# Compress document bodies with zstd (default: false).
# Documents written while compression was on can only be read back with
# compression on.
compression = false

# zstd level, 1 (fastest) to 22 (smallest). Default: 3
compression_level = 3

# Touches remembered for pre-touch -> post-touch etag lookups
touch_ledger_capacity = 65536

# Restarts half of issued etags. Bump it when the change counter is reset.
etag_restarts = 1

[cache]
enabled = true
max_entries = 4096
max_size_bytes = 67108864
"#
    }

    /// Parse config from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the text does not parse or a value is out
    /// of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{} (in '{}')", msg, path.display()))
            }
            other => other,
        })?;
        info!(target: "docstore::config", path = %path.display(), compression = config.compression, "Loaded store config");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.compression && !COMPRESSION_LEVELS.contains(&self.compression_level) {
            return Err(Error::InvalidConfig(format!(
                "compression_level must be between {} and {}, got {}",
                COMPRESSION_LEVELS.start(),
                COMPRESSION_LEVELS.end(),
                self.compression_level
            )));
        }
        if self.cache.enabled && (self.cache.max_entries == 0 || self.cache.max_size_bytes == 0) {
            return Err(Error::InvalidConfig(
                "cache.max_entries and cache.max_size_bytes must be non-zero when the cache is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
