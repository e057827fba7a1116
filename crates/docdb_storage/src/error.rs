//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested path does not exist.
    #[error("no such path: {path}")]
    NotFound {
        /// The path that was requested.
        path: String,
    },

    /// A directory operation was attempted on a non-directory path.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: String,
    },
}

impl StorageError {
    /// Creates a not-found error for a path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a not-a-directory error for a path.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory { path: path.into() }
    }
}
