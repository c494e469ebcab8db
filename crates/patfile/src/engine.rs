//! Pattern file engine: create, overwrite and validate pattern files.
//!
//! All operations stream through a fixed-size buffer (the block size of
//! [`PatternConfig`]), so memory use does not depend on file size.
//! Expected bytes are recomputed per chunk from [`fill_pattern`]; nothing is
//! cached between chunks or between calls.
//!
//! # Example
//!
//! ```no_run
//! use patfile::{PatternConfig, PatternEngine};
//!
//! let engine = PatternEngine::new(PatternConfig::with_block_size(1 << 20)?);
//! engine.create("/mnt/under-test/fixture.bin", 10 * 1024 * 1024)?;
//! // ... remount, copy, crash, whatever the test does ...
//! engine.validate("/mnt/under-test/fixture.bin")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use tracing::{debug, instrument, trace, warn};

use crate::config::PatternConfig;
use crate::error::{
    EngineError, IoContext, MISMATCH_DUMP_LEN, PatternError, SizeMismatch, ValidationError,
};
use crate::pattern::{
    HEADER_SIZE, chunk_len, decode_header, encode_header, fill_pattern, first_mismatch,
};

/// Generates and checks pattern files.
///
/// Holds only configuration, so it is cheap to copy and safe to share across
/// threads. Calls on different paths are independent; concurrent calls on the
/// same path are not coordinated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEngine {
    config: PatternConfig,
}

impl PatternEngine {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Create (or truncate) `path` and fill it with a pattern of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than the 8-byte header.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display(), size = size))]
    pub fn create(&self, path: impl AsRef<Path>, size: u64) -> Result<(), EngineError> {
        let path = path.as_ref();
        assert!(
            size >= HEADER_SIZE,
            "pattern files need at least {HEADER_SIZE} bytes, requested {size}"
        );
        let context = IoContext::new().with_operation("create").with_path(path);

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| EngineError::io_with_context(e, context.clone()))?;

        write_pattern(&mut file, size, self.config.block_size, &context)?;
        self.finish(&file, &context)?;

        debug!("Pattern file created");
        Ok(())
    }

    /// Rewrite `path` in place with the pattern for its current length.
    ///
    /// The file is not truncated or extended: the result is byte-identical to
    /// [`create`](Self::create) with the file's existing size.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn overwrite(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        let context = IoContext::new().with_operation("overwrite").with_path(path);

        let size = fs::metadata(path)
            .map_err(|e| EngineError::io_with_context(e, context.clone()))?
            .len();
        if size < HEADER_SIZE {
            warn!(size, "File too small to overwrite with a pattern");
            return Err(EngineError::TooSmall {
                path: path.to_path_buf(),
                size,
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| EngineError::io_with_context(e, context.clone()))?;

        write_pattern(&mut file, size, self.config.block_size, &context)?;
        self.finish(&file, &context)?;

        debug!(size, "Pattern file overwritten");
        Ok(())
    }

    /// Check that `path` holds a valid pattern file.
    ///
    /// Returns `Ok(())` only if the size header matches the on-disk size and
    /// every byte matches the pattern. See [`validate_stream`] for the exact
    /// checks.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<(), PatternError> {
        let path = path.as_ref();
        let context = IoContext::new().with_operation("validate").with_path(path);

        let mut file =
            File::open(path).map_err(|e| EngineError::io_with_context(e, context.clone()))?;
        let actual_size = file
            .metadata()
            .map_err(|e| EngineError::io_with_context(e, context.clone()))?
            .len();

        validate_stream(&mut file, actual_size, self.config.block_size, &context)?;

        debug!(size = actual_size, "Pattern file is valid");
        Ok(())
    }

    fn finish(&self, file: &File, context: &IoContext) -> Result<(), EngineError> {
        if self.config.sync_on_close {
            trace!("Syncing file before close");
            file.sync_all()
                .map_err(|e| EngineError::io_with_context(e, context.clone()))?;
        }
        Ok(())
    }
}

/// Write a complete pattern of `size` bytes (header included) to `writer`.
///
/// Writes go out in chunks of at most `block_size` bytes.
///
/// # Panics
///
/// Panics if `size` is smaller than the 8-byte header.
pub fn write_pattern<W: Write>(
    writer: &mut W,
    size: u64,
    block_size: NonZeroUsize,
    context: &IoContext,
) -> Result<(), EngineError> {
    assert!(
        size >= HEADER_SIZE,
        "pattern files need at least {HEADER_SIZE} bytes, requested {size}"
    );

    writer
        .write_all(&encode_header(size))
        .map_err(|e| EngineError::io_with_context(e, context.clone().with_offset(0)))?;

    let mut offset = HEADER_SIZE;
    let mut remaining = size - HEADER_SIZE;
    let mut buffer = vec![0u8; chunk_len(remaining, block_size.get())];

    while remaining > 0 {
        let len = chunk_len(remaining, block_size.get());
        let chunk = &mut buffer[..len];
        fill_pattern(chunk, offset);

        trace!(offset, len, "Writing chunk");
        writer
            .write_all(chunk)
            .map_err(|e| EngineError::io_with_context(e, context.clone().with_offset(offset)))?;

        offset += len as u64;
        remaining -= len as u64;
    }

    writer
        .flush()
        .map_err(|e| EngineError::io_with_context(e, context.clone()))
}

/// Validate a pattern stream of `actual_size` bytes read from `reader`.
///
/// 1. Fewer than 8 bytes: [`ValidationError::ShortFile`], nothing else is
///    checked.
/// 2. A header disagreeing with `actual_size` is remembered, not returned,
///    so the content check still runs over the bytes that exist.
/// 3. Content is compared chunk by chunk. The first differing byte yields
///    [`ValidationError::DataMismatch`] with its absolute offset, byte dumps
///    and any size mismatch from step 2.
/// 4. Clean content with a remembered size mismatch yields
///    [`ValidationError::SizeMismatch`].
///
/// A reader that runs dry inside the payload is an I/O failure, not a
/// data problem.
pub fn validate_stream<R: Read>(
    reader: &mut R,
    actual_size: u64,
    block_size: NonZeroUsize,
    context: &IoContext,
) -> Result<(), PatternError> {
    if actual_size < HEADER_SIZE {
        warn!(actual_size, "File too short to hold a size header");
        return Err(ValidationError::ShortFile { actual_size }.into());
    }

    let mut header = [0u8; 8];
    reader
        .read_exact(&mut header)
        .map_err(|e| -> PatternError {
            match e.kind() {
                io::ErrorKind::UnexpectedEof => ValidationError::ShortFile { actual_size }.into(),
                _ => EngineError::io_with_context(e, context.clone().with_offset(0)).into(),
            }
        })?;

    let expected_size = decode_header(&header);
    let size_mismatch = (expected_size != actual_size).then_some(SizeMismatch {
        expected: expected_size,
        actual: actual_size,
    });
    if size_mismatch.is_some() {
        warn!(expected_size, actual_size, "Size header does not match file size");
    }

    let mut offset = HEADER_SIZE;
    let mut remaining = actual_size - HEADER_SIZE;
    let buffer_len = chunk_len(remaining, block_size.get());
    let mut expected = vec![0u8; buffer_len];
    let mut actual = vec![0u8; buffer_len];

    while remaining > 0 {
        let len = chunk_len(remaining, block_size.get());
        let expected_chunk = &mut expected[..len];
        let actual_chunk = &mut actual[..len];

        fill_pattern(expected_chunk, offset);
        reader
            .read_exact(actual_chunk)
            .map_err(|e| EngineError::io_with_context(e, context.clone().with_offset(offset)))?;
        trace!(offset, len, "Comparing chunk");

        if actual_chunk != expected_chunk {
            let index = first_mismatch(actual_chunk, expected_chunk)
                .unwrap_or_else(|| unreachable!("chunks differ but no differing byte was found"));
            let end = (index + MISMATCH_DUMP_LEN).min(len);
            let mismatch_offset = offset + index as u64;
            warn!(offset = mismatch_offset, "Data mismatch");
            return Err(ValidationError::DataMismatch {
                offset: mismatch_offset,
                expected: expected_chunk[index..end].to_vec(),
                actual: actual_chunk[index..end].to_vec(),
                size_mismatch,
            }
            .into());
        }

        offset += len as u64;
        remaining -= len as u64;
    }

    match size_mismatch {
        Some(mismatch) => Err(ValidationError::SizeMismatch(mismatch).into()),
        None => Ok(()),
    }
}
