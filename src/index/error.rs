use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or querying the knowledge-base artifacts.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("snippet metadata {path} is invalid: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index serialization failed: {0}")]
    Serialization(String),
}

pub type IndexResult<T> = Result<T, IndexError>;
