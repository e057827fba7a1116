//! In-process transaction buffer.
//!
//! A transaction is two pieces of state: an append-only log of pending
//! operations, replayed in order on the outermost commit, and an overlay
//! map giving read-your-own-writes visibility for uncommitted changes.
//! Transactions nest through a depth counter; only the outermost commit
//! flushes, and rollback discards everything at any depth.

use std::collections::HashMap;

/// A buffered operation, replayed against the backend on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingOp {
    /// Write `payload` at `path`.
    Put {
        /// Target path.
        path: String,
        /// Encoded bytes to write.
        payload: Vec<u8>,
    },
    /// Delete the file at `path`.
    Delete {
        /// Target path.
        path: String,
    },
}

impl PendingOp {
    /// The path this operation targets.
    pub(crate) fn path(&self) -> &str {
        match self {
            Self::Put { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Transaction state owned by a `Database`.
///
/// The overlay maps a path to its last pending payload, or to `None` when
/// the pending operation is a delete. Reads consult the overlay before the
/// backend; directory listings never do.
#[derive(Debug, Default)]
pub(crate) struct TransactionState {
    depth: u32,
    log: Vec<PendingOp>,
    overlay: HashMap<String, Option<Vec<u8>>>,
}

impl TransactionState {
    /// Whether a transaction is currently open.
    pub(crate) fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }

    /// Opens a transaction level.
    pub(crate) fn begin(&mut self) {
        self.depth += 1;
    }

    /// Closes one nested level. Must not be called at the outermost level;
    /// use [`TransactionState::take_log`] there instead.
    pub(crate) fn release_nested(&mut self) {
        debug_assert!(self.depth > 1);
        self.depth -= 1;
    }

    /// Buffers a put and makes it visible to reads.
    pub(crate) fn record_put(&mut self, path: String, payload: Vec<u8>) {
        self.overlay.insert(path.clone(), Some(payload.clone()));
        self.log.push(PendingOp::Put { path, payload });
    }

    /// Buffers a delete and masks the path from reads.
    pub(crate) fn record_delete(&mut self, path: String) {
        self.overlay.insert(path.clone(), None);
        self.log.push(PendingOp::Delete { path });
    }

    /// Looks up the pending value for a path.
    ///
    /// `None` means the transaction has nothing buffered for the path;
    /// `Some(None)` means a pending delete.
    pub(crate) fn pending(&self, path: &str) -> Option<&Option<Vec<u8>>> {
        if !self.is_active() {
            return None;
        }
        self.overlay.get(path)
    }

    /// Takes the operation log for replay and resets all state.
    pub(crate) fn take_log(&mut self) -> Vec<PendingOp> {
        self.depth = 0;
        self.overlay.clear();
        std::mem::take(&mut self.log)
    }

    /// Discards all state unconditionally, regardless of depth.
    pub(crate) fn clear(&mut self) {
        self.depth = 0;
        self.log.clear();
        self.overlay.clear();
    }

    /// Number of buffered operations.
    pub(crate) fn pending_count(&self) -> usize {
        self.log.len()
    }
}
