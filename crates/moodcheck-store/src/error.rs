//! Error types for the local store

use std::path::PathBuf;

/// Local storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key contains characters that cannot be mapped to a file name
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Filesystem operation failed
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Collection could not be encoded
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Wrap an I/O error with the path it concerns
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
