//! File-based storage backend for persistent storage.

use crate::backend::{DirEntry, StorageBackend};
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A file-based storage backend rooted at a local directory.
///
/// Logical paths map directly onto the directory tree under the root:
/// `people/1` becomes `<root>/people/1`. Data survives process restarts.
///
/// Directory listings are sorted by name so that scans over them are
/// deterministic regardless of the order the OS returns entries in.
///
/// # Thread Safety
///
/// The backend holds no mutable state of its own; all state lives in the
/// file system. It can be shared across threads, with the usual
/// last-write-wins caveat for uncoordinated writers.
///
/// # Example
///
/// ```no_run
/// use docdb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("my_store")).unwrap();
/// backend.create_dir("people/");
/// backend.write("people/1", b"{\"id\":1}");
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Opens a backend rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the root directory of the backend.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_matches('/'))
    }
}

impl StorageBackend for FileBackend {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match fs::read(self.resolve(path)) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> bool {
        fs::write(self.resolve(path), data).is_ok()
    }

    fn delete(&self, path: &str) -> bool {
        fs::remove_file(self.resolve(path)).is_ok()
    }

    fn create_dir(&self, path: &str) -> bool {
        fs::create_dir_all(self.resolve(path)).is_ok()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn list_dir(&self, path: &str) -> StorageResult<Vec<DirEntry>> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(StorageError::not_found(path));
        }
        if !full.is_dir() {
            return Err(StorageError::not_a_directory(path));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type()?;
            if file_type.is_file() {
                entries.push(DirEntry::file(name));
            } else if file_type.is_dir() {
                entries.push(DirEntry::dir(name));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
