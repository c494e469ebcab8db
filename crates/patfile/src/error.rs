//! Error types for pattern file operations.
//!
//! Failures fall into two tiers with separate types:
//!
//! - [`ValidationError`]: the file content is wrong (short file, size header
//!   mismatch, corrupted bytes). This is what validation exists to find, and
//!   carries enough context for a harness or a human to act on.
//! - [`EngineError`]: the environment is broken (open, stat, read, write or
//!   sync failed). Nothing about the data can be concluded.
//!
//! [`PatternError`] joins the two for [`validate`](crate::PatternEngine::validate),
//! which can hit either.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::pattern::HEADER_SIZE;

/// Maximum number of bytes shown on each side of a data mismatch dump.
pub const MISMATCH_DUMP_LEN: usize = 32;

/// Context for I/O failures, providing debugging information.
#[derive(Debug, Clone, Default)]
pub struct IoContext {
    /// The engine operation being performed
    pub operation: Option<&'static str>,
    /// The file being accessed
    pub path: Option<PathBuf>,
    /// Absolute file offset where the failing read or write started
    pub offset: Option<u64>,
}

impl IoContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for IoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(operation) = self.operation {
            parts.push(operation.to_string());
        }
        if let Some(offset) = self.offset {
            parts.push(format!("at offset {offset}"));
        }
        if let Some(ref path) = self.path {
            parts.push(format!("of {:?}", path.display()));
        }

        if parts.is_empty() {
            write!(f, "(no context)")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// Unrecoverable failure of the execution environment.
///
/// Never retried: these say nothing about whether the data is correct.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An open, stat, read, write or sync call failed or came up short.
    #[error("IO error during {context}: {source}")]
    Io {
        #[source]
        source: io::Error,
        context: IoContext,
    },

    /// The file is too small to hold a size header, so no pattern fits.
    #[error(
        "{:?} is {size} bytes long, pattern files need at least {min} bytes",
        .path.display(),
        min = HEADER_SIZE
    )]
    TooSmall { path: PathBuf, size: u64 },
}

impl From<io::Error> for EngineError {
    fn from(source: io::Error) -> Self {
        EngineError::Io {
            source,
            context: IoContext::new(),
        }
    }
}

impl EngineError {
    /// Create an IO error with context
    #[must_use]
    pub fn io_with_context(source: io::Error, context: IoContext) -> Self {
        EngineError::Io { source, context }
    }
}

/// Size header disagrees with the size actually on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    /// Size recorded in the header
    pub expected: u64,
    /// Size reported by the filesystem
    pub actual: u64,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file should be {} bytes long, but is {} bytes long",
            self.expected, self.actual
        )
    }
}

/// The file exists and is readable, but its content is not a valid pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The file cannot even hold the size header. No content check was done.
    #[error("file too short ({actual_size} bytes)")]
    ShortFile { actual_size: u64 },

    /// Every byte present matched the pattern, but the header claims a
    /// different size.
    #[error("{0}\nThe rest of the file is OK")]
    SizeMismatch(SizeMismatch),

    /// A byte differs from the pattern.
    ///
    /// `expected` and `actual` hold up to [`MISMATCH_DUMP_LEN`] bytes starting
    /// at `offset`. A size mismatch found before the content check is kept
    /// alongside so both problems surface together.
    #[error(
        "{}data mismatch at offset {offset}. Expected/actual:\n{}\n{}",
        size_prefix(.size_mismatch.as_ref()),
        hex_pairs(.expected),
        hex_pairs(.actual)
    )]
    DataMismatch {
        offset: u64,
        expected: Vec<u8>,
        actual: Vec<u8>,
        size_mismatch: Option<SizeMismatch>,
    },
}

impl ValidationError {
    /// Absolute file offset of the first corrupted byte, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            ValidationError::DataMismatch { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// The header/size disagreement, if one was found.
    pub fn size_mismatch(&self) -> Option<SizeMismatch> {
        match self {
            ValidationError::SizeMismatch(mismatch) => Some(*mismatch),
            ValidationError::DataMismatch { size_mismatch, .. } => *size_mismatch,
            ValidationError::ShortFile { .. } => None,
        }
    }
}

fn size_prefix(mismatch: Option<&SizeMismatch>) -> String {
    mismatch.map(|m| format!("{m}\n")).unwrap_or_default()
}

/// Render bytes as two-digit lowercase hex pairs separated by spaces.
pub fn hex_pairs(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of validating a file: either tier can occur.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("unrecoverable: {0}")]
    Fatal(#[from] EngineError),
}

impl PatternError {
    /// Whether the failure came from the environment rather than the data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PatternError::Fatal(_))
    }

    /// The data problem, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            PatternError::Invalid(e) => Some(e),
            PatternError::Fatal(_) => None,
        }
    }
}

/// Invalid engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size must be a positive number of bytes")]
    ZeroBlockSize,
}
