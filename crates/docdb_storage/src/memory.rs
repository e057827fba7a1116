//! In-memory storage backend for testing.

use crate::backend::{DirEntry, EntryKind, StorageBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// An in-memory storage backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Paths are stored in a sorted map, so directory listings are returned in
/// name order and scans over them are deterministic.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use docdb_storage::{StorageBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// backend.create_dir("people/");
/// backend.write("people/1", b"data");
/// assert!(backend.exists("people/1"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: RwLock<BTreeMap<String, Node>>,
}

/// A trailing slash is insignificant; `people/` and `people` address the
/// same node.
fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the file contents at `path`, if present.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.read().get(normalize(path)) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Returns the paths of all stored files, in sorted order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<String> {
        self.nodes
            .read()
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Removes all files and directories from the backend.
    pub fn clear(&self) {
        self.nodes.write().clear();
    }
}

impl StorageBackend for MemoryBackend {
    fn exists(&self, path: &str) -> bool {
        self.nodes.read().contains_key(normalize(path))
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match self.nodes.read().get(normalize(path)) {
            Some(Node::File(data)) => Ok(data.clone()),
            _ => Err(StorageError::not_found(path)),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> bool {
        let path = normalize(path);
        if path.is_empty() {
            return false;
        }
        let mut nodes = self.nodes.write();
        if matches!(nodes.get(path), Some(Node::Dir)) {
            return false;
        }
        nodes.insert(path.to_string(), Node::File(data.to_vec()));
        true
    }

    fn delete(&self, path: &str) -> bool {
        let path = normalize(path);
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                true
            }
            _ => false,
        }
    }

    fn create_dir(&self, path: &str) -> bool {
        let path = normalize(path);
        if path.is_empty() {
            return false;
        }
        let mut nodes = self.nodes.write();
        if matches!(nodes.get(path), Some(Node::File(_))) {
            return false;
        }
        // Ancestors become directories as well, like create_dir_all.
        let mut prefix = String::new();
        for segment in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            nodes.entry(prefix.clone()).or_insert(Node::Dir);
        }
        true
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.read().get(normalize(path)), Some(Node::Dir))
    }

    fn list_dir(&self, path: &str) -> StorageResult<Vec<DirEntry>> {
        let path = normalize(path);
        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(StorageError::not_a_directory(path)),
            None => return Err(StorageError::not_found(path)),
        }

        let prefix = format!("{path}/");
        let entries = nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, node)| {
                let rest = &key[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                Some(match node {
                    Node::File(_) => DirEntry::file(rest),
                    Node::Dir => DirEntry::dir(rest),
                })
            })
            .collect();
        Ok(entries)
    }
}
