//! Deterministic pattern files for storage and filesystem testing.
//!
//! A pattern file's content is a pure function of its size, so any byte can be
//! checked without keeping a copy of what was written. Write one through the
//! stack under test, read it back later, and [`PatternEngine::validate`]
//! reports the first corrupted byte with expected/actual dumps.
//!
//! # File Format
//!
//! - **Header (8 bytes)**: total file size, big-endian u64
//! - **Payload**: 8-byte big-endian blocks; the block at absolute offset `o`
//!   holds `0x0807060504030201 + o` (wrapping). A trailing partial block is
//!   truncated.
//!
//! A 24-byte file:
//!
//! ```text
//! 00 00 00 00 00 00 00 18  08 07 06 05 04 03 02 09  08 07 06 05 04 03 02 11
//! ```
//!
//! # Components
//!
//! - [`pattern`] - The offset→block function and header codec
//! - [`PatternEngine`] - Create, overwrite and validate files on disk
//! - [`write_pattern`] / [`validate_stream`] - The same logic over any
//!   `Write` / `Read`
//! - [`PatternConfig`] - Streaming block size and sync policy
//!
//! # Errors
//!
//! Data problems ([`ValidationError`]) and environment failures
//! ([`EngineError`]) are separate types; [`PatternError`] carries either
//! out of `validate`.
//!
//! # Example
//!
//! ```
//! use patfile::{PatternEngine, ValidationError};
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("fixture.bin");
//!
//! let engine = PatternEngine::default();
//! engine.create(&path, 4096)?;
//! engine.validate(&path)?;
//!
//! // Corrupt one byte
//! let mut bytes = std::fs::read(&path)?;
//! bytes[100] ^= 0xFF;
//! std::fs::write(&path, &bytes)?;
//!
//! let err = engine.validate(&path).unwrap_err();
//! assert_eq!(err.validation().and_then(ValidationError::offset), Some(100));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod pattern;

pub use config::{DEFAULT_BLOCK_SIZE, PatternConfig};
pub use engine::{PatternEngine, validate_stream, write_pattern};
pub use error::{
    ConfigError, EngineError, IoContext, MISMATCH_DUMP_LEN, PatternError, SizeMismatch,
    ValidationError,
};
pub use pattern::{HEADER_SIZE, PATTERN_BASE, expected_bytes, fill_pattern};
