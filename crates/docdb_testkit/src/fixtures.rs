//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases over
//! both shipped backends.

use docdb_core::Database;
use docdb_storage::MemoryBackend;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// Handle to the in-memory backend, when in-memory.
    pub memory: Option<Arc<MemoryBackend>>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    ///
    /// The backend handle is kept so tests can assert on raw stored
    /// bytes.
    #[must_use]
    pub fn memory() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        Self {
            db: Database::new(backend.clone()),
            memory: Some(backend),
            _temp_dir: None,
        }
    }

    /// Creates a new file-based test database under a temp directory.
    #[must_use]
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db = Database::open(temp_dir.path()).expect("failed to open file database");
        Self {
            db,
            memory: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store's root directory if file-based, `None` if
    /// in-memory.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use docdb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     let table = db.table("test").unwrap();
///     assert!(table.find(docdb_core::Selector::All).unwrap().is_empty());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &std::path::Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("file database has a path");
    f(&test_db.db, &path)
}
