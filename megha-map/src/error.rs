//! Error types for the voxel map.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by map configuration, queries, and persistence.
#[derive(Debug, Error)]
pub enum MapError {
    /// Illegal voxel parameters.
    #[error("invalid voxel configuration: {0}")]
    InvalidConfig(String),

    /// Centroid requested on a voxel with no points.
    #[error("centroid requested on an empty voxel")]
    EmptyVoxel,

    /// File read/write failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation touched
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Malformed binary stream: unknown schema version, truncation, or
    /// inconsistent data.
    #[error("corrupt map stream at byte {offset}: {reason}")]
    Corrupt {
        /// Byte offset where decoding failed
        offset: u64,
        /// What was wrong
        reason: String,
    },
}

impl MapError {
    /// Attach a path to a raw I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for map operations.
pub type Result<T> = std::result::Result<T, MapError>;
