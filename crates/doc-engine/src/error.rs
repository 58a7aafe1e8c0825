//! Error types.
//!
//! Synchronous components (buffer, search, indentation) report [`UsageError`]. Everything that
//! goes through the runtime bridge reports [`EngineError`], which adds the runtime lifecycle
//! conditions and file I/O failures.

use crate::position::{Position, Range};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Invalid input passed to a strict API. Never mutates state.
pub enum UsageError {
    #[error("line {line} is out of range (line count {line_count})")]
    /// A line index was outside `[0, line_count)`.
    LineOutOfRange {
        /// The requested line.
        line: usize,
        /// The buffer's line count at the time of the call.
        line_count: usize,
    },

    #[error("position {0} is outside the document")]
    /// A position addressed a column past the end of its line, or a missing line.
    PositionOutOfRange(Position),

    #[error("invalid range {0}")]
    /// A range whose start is after its end, or whose ends are outside the document.
    InvalidRange(Range),

    #[error("invalid search pattern: {0}")]
    /// A regex pattern failed to compile.
    InvalidPattern(String),

    #[error("unknown mode '{0}'")]
    /// `set_mode` was called with a name the registry does not know.
    UnknownMode(String),

    #[error("document has no url to save to")]
    /// `save()` was called on a document that was never opened or saved with a path.
    NoUrl,

    #[error("document operations cannot be issued from the runtime thread")]
    /// A document call was made from inside the runtime's own event loop.
    ReentrantCall,

    #[error("document {0} does not exist in the runtime")]
    /// The document was released, or belongs to a runtime that has been restarted.
    UnknownDocument(u64),
}

/// Why a file could not be opened or saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFailureKind {
    /// The path does not exist.
    NotFound,
    /// The process may not read or write the path.
    PermissionDenied,
    /// The file content is not valid UTF-8.
    Encoding,
    /// Any other I/O error.
    Other,
}

impl IoFailureKind {
    /// Classify an `io::Error`.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::InvalidData => Self::Encoding,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for IoFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotFound => "path not found",
            Self::PermissionDenied => "permission denied",
            Self::Encoding => "encoding error",
            Self::Other => "i/o error",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
#[error("{kind} for {}: {source}", path.display())]
/// An open/save failure with its reason.
pub struct IoFailure {
    /// Classified reason.
    pub kind: IoFailureKind,
    /// The path that was being read or written.
    pub path: PathBuf,
    /// The underlying error.
    #[source]
    pub source: io::Error,
}

impl IoFailure {
    /// Wrap an `io::Error` raised while accessing `path`.
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            kind: IoFailureKind::from_io(&source),
            path: path.into(),
            source,
        }
    }

    /// Build an encoding failure for `path`.
    pub fn encoding(path: impl Into<PathBuf>, source: impl fmt::Display) -> Self {
        Self {
            kind: IoFailureKind::Encoding,
            path: path.into(),
            source: io::Error::new(io::ErrorKind::InvalidData, source.to_string()),
        }
    }
}

#[derive(Debug, Error)]
/// Errors reported by document and bridge operations.
pub enum EngineError {
    #[error(transparent)]
    /// Invalid arguments.
    Usage(#[from] UsageError),

    #[error("document engine runtime is not running")]
    /// The runtime has not been initialized, or has been shut down.
    NotInitialized,

    #[error("document engine runtime unavailable: {0}")]
    /// The runtime could not be constructed. Permanent for the bridge that reported it.
    RuntimeUnavailable(String),

    #[error(transparent)]
    /// A file could not be opened or saved.
    Io(#[from] IoFailure),
}

impl EngineError {
    /// Returns the I/O failure kind, if this is an I/O error.
    pub fn io_kind(&self) -> Option<IoFailureKind> {
        match self {
            Self::Io(failure) => Some(failure.kind),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
/// Errors produced while loading an [`EngineConfig`](crate::EngineConfig).
pub enum ConfigError {
    #[error("I/O error: {0}")]
    /// Reading the config file failed.
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    /// The JSON did not match the config schema.
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    /// A value was syntactically fine but not usable.
    Invalid(String),
}
