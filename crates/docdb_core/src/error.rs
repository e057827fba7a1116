//! Error types for docdb core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in docdb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record or table directory does not exist, or a first-mode query
    /// matched nothing. Recoverable; no partial state was changed.
    #[error("not found: {path}")]
    NotFound {
        /// The path (or table directory) that was requested.
        path: String,
    },

    /// The storage backend rejected a write, delete, or directory creation
    /// outside a transaction. The backing store may now disagree with the
    /// caller's intent.
    #[error("storage rejected write: {path}")]
    WriteFailed {
        /// The path the backend refused to mutate.
        path: String,
    },

    /// The outermost commit replayed its buffer and the backend rejected
    /// one or more operations. Every operation was attempted exactly once;
    /// `failures` lists the rejected paths in replay order.
    #[error("commit applied partially; {} operation(s) rejected", failures.len())]
    PartialCommit {
        /// Paths of the rejected operations, in replay order.
        failures: Vec<String>,
    },

    /// Storage backend error surfaced during a read or listing.
    #[error("storage error: {0}")]
    Storage(#[from] docdb_storage::StorageError),

    /// Record encoding or decoding failed. Stored bytes that fail to decode
    /// are a defect in the backing store, not a recoverable condition.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a not-found error for a path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a write-failed error for a path.
    pub fn write_failed(path: impl Into<String>) -> Self {
        Self::WriteFailed { path: path.into() }
    }

    /// Returns `true` for the recoverable not-found case.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
