//! Failure-injecting backend wrapper.
//!
//! The original store signals write failure by returning `false` from the
//! storage port; this wrapper lets tests script exactly that, per path,
//! while delegating everything else to a real backend.

use docdb_storage::{DirEntry, StorageBackend, StorageResult};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Wraps a backend and rejects selected mutating operations.
///
/// Reads always pass through. Writes, deletes, and directory creations
/// targeting a registered path return `false`, exactly like a backend
/// refusing the operation.
///
/// # Example
///
/// ```rust
/// use docdb_storage::{MemoryBackend, StorageBackend};
/// use docdb_testkit::RejectingBackend;
/// use std::sync::Arc;
///
/// let backend = RejectingBackend::new(Arc::new(MemoryBackend::new()));
/// backend.reject_writes_at("people/1");
/// assert!(backend.create_dir("people/"));
/// assert!(!backend.write("people/1", b"data"));
/// ```
pub struct RejectingBackend {
    inner: Arc<dyn StorageBackend>,
    reject_writes: RwLock<HashSet<String>>,
    reject_deletes: RwLock<HashSet<String>>,
    reject_dirs: RwLock<HashSet<String>>,
}

impl RejectingBackend {
    /// Wraps a backend with no rejections registered.
    pub fn new(inner: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner,
            reject_writes: RwLock::new(HashSet::new()),
            reject_deletes: RwLock::new(HashSet::new()),
            reject_dirs: RwLock::new(HashSet::new()),
        }
    }

    /// Makes `write` return `false` for a path.
    pub fn reject_writes_at(&self, path: impl Into<String>) {
        self.reject_writes.write().insert(path.into());
    }

    /// Makes `delete` return `false` for a path.
    pub fn reject_deletes_at(&self, path: impl Into<String>) {
        self.reject_deletes.write().insert(path.into());
    }

    /// Makes `create_dir` return `false` for a path.
    pub fn reject_create_dir_at(&self, path: impl Into<String>) {
        self.reject_dirs.write().insert(path.into());
    }

    /// Clears every registered rejection.
    pub fn allow_all(&self) {
        self.reject_writes.write().clear();
        self.reject_deletes.write().clear();
        self.reject_dirs.write().clear();
    }
}

impl StorageBackend for RejectingBackend {
    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&self, path: &str, data: &[u8]) -> bool {
        if self.reject_writes.read().contains(path) {
            return false;
        }
        self.inner.write(path, data)
    }

    fn delete(&self, path: &str) -> bool {
        if self.reject_deletes.read().contains(path) {
            return false;
        }
        self.inner.delete(path)
    }

    fn create_dir(&self, path: &str) -> bool {
        if self.reject_dirs.read().contains(path) {
            return false;
        }
        self.inner.create_dir(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.inner.is_dir(path)
    }

    fn list_dir(&self, path: &str) -> StorageResult<Vec<DirEntry>> {
        self.inner.list_dir(path)
    }
}
