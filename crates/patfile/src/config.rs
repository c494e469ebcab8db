//! Engine configuration.
//!
//! The engine never reads configuration on its own: whoever drives it (a test
//! harness, a CLI, a config file loader) builds a [`PatternConfig`] and hands
//! it over. The type is `serde`-friendly so it can be embedded in the caller's
//! own configuration format.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default streaming chunk size (64 KiB).
pub const DEFAULT_BLOCK_SIZE: NonZeroUsize = match NonZeroUsize::new(64 * 1024) {
    Some(size) => size,
    None => unreachable!(),
};

/// Configuration options for the pattern file engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Number of bytes read or written per I/O call.
    ///
    /// Bounds memory use independently of file size. Values that are not a
    /// multiple of 8 work, but large powers of two are the usual choice.
    /// Default: 64 KiB.
    pub block_size: NonZeroUsize,

    /// Whether `create` and `overwrite` fsync the file before closing it.
    ///
    /// Useful when the storage under test must be forced to persist the
    /// pattern before a crash or remount. Default: false.
    pub sync_on_close: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            sync_on_close: false,
        }
    }
}

impl PatternConfig {
    /// Creates a configuration with the given block size in bytes.
    pub fn with_block_size(block_size: usize) -> Result<Self, ConfigError> {
        let block_size = NonZeroUsize::new(block_size).ok_or(ConfigError::ZeroBlockSize)?;
        Ok(Self {
            block_size,
            ..Default::default()
        })
    }

    /// Sets the streaming block size.
    #[must_use]
    pub fn block_size(mut self, block_size: NonZeroUsize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets whether files are fsynced before being closed.
    #[must_use]
    pub fn sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = PatternConfig::default();
        assert_eq!(config.block_size.get(), 65536);
        assert!(!config.sync_on_close);
    }

    #[test]
    fn test_with_block_size() {
        let config = PatternConfig::with_block_size(13).unwrap();
        assert_eq!(config.block_size.get(), 13);
        assert!(!config.sync_on_close);
    }

    #[test]
    fn test_with_block_size_rejects_zero() {
        assert_eq!(
            PatternConfig::with_block_size(0),
            Err(ConfigError::ZeroBlockSize)
        );
    }

    #[test]
    fn test_builder() {
        let config = PatternConfig::default()
            .block_size(NonZeroUsize::new(4096).unwrap())
            .sync_on_close(true);
        assert_eq!(config.block_size.get(), 4096);
        assert!(config.sync_on_close);
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: PatternConfig = toml::from_str("sync_on_close = true").unwrap();
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert!(config.sync_on_close);
    }

    #[test]
    fn test_deserialize_block_size() {
        let config: PatternConfig = toml::from_str("block_size = 1048576").unwrap();
        assert_eq!(config.block_size.get(), 1 << 20);
    }

    #[test]
    fn test_deserialize_rejects_zero_block_size() {
        assert!(toml::from_str::<PatternConfig>("block_size = 0").is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = PatternConfig::with_block_size(512).unwrap().sync_on_close(true);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(toml::from_str::<PatternConfig>(&text).unwrap(), config);
    }
}
