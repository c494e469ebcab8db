//! Shared helpers for pattern file integration tests.

#![allow(dead_code)]

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use patfile::{PatternConfig, PatternEngine};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A temporary directory plus an engine with the given block size.
pub struct Fixture {
    pub dir: TempDir,
    pub engine: PatternEngine,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_block_size(64 * 1024)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        init_tracing();
        let config = PatternConfig::with_block_size(block_size).expect("valid block size");
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            engine: PatternEngine::new(config),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// XOR the byte at `offset` with `mask` in place.
pub fn flip_byte(path: &Path, offset: u64, mask: u8) {
    let mut bytes = fs::read(path).expect("read failed");
    let index = usize::try_from(offset).expect("offset fits in usize");
    bytes[index] ^= mask;
    fs::write(path, &bytes).expect("write failed");
}

/// Overwrite the size header without touching the payload.
pub fn rewrite_header(path: &Path, claimed_size: u64) {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("open failed");
    file.seek(SeekFrom::Start(0)).expect("seek failed");
    file.write_all(&claimed_size.to_be_bytes())
        .expect("write failed");
}

/// Assert that two byte slices are equal, reporting the first differing
/// position instead of dumping both buffers.
pub fn assert_bytes_equal(actual: &[u8], expected: &[u8], context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: size mismatch - expected {} bytes, got {} bytes",
        expected.len(),
        actual.len()
    );

    if let Some(i) = actual.iter().zip(expected).position(|(a, e)| a != e) {
        panic!(
            "{}: content mismatch at byte {} - expected 0x{:02x}, got 0x{:02x}",
            context, i, expected[i], actual[i]
        );
    }
}
