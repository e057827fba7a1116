//! Database facade and transaction protocol.

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::table::Table;
use crate::transaction::{PendingOp, TransactionState};
use docdb_storage::{EntryKind, FileBackend, MemoryBackend, StorageBackend};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Reserved file name of the per-table auto-increment counter.
///
/// The counter lives inside the table directory and is never returned by
/// record enumeration.
pub const AUTO_INCREMENT_FILE: &str = ".auto";

/// The main database handle.
///
/// `Database` is the single choke point between logical records and the
/// storage backend. It owns the table cache, the identifier-allocation
/// protocol, and the in-process transaction buffer. Handles are cheap to
/// clone and share one underlying state.
///
/// # Transactions
///
/// [`Database::begin`] opens a transaction; while one is active, saves and
/// deletes are buffered in order and reads see the buffered state. Nested
/// `begin` calls only deepen a counter - the buffer is flushed by the
/// outermost [`Database::commit`], and [`Database::rollback`] discards
/// everything at any depth. Transactions are process-local: they batch
/// operations and give read-your-own-writes visibility, nothing more. A
/// crash mid-flush leaves the backing store partially updated.
///
/// # Example
///
/// ```rust
/// use docdb_core::{Database, Record};
///
/// let db = Database::in_memory();
/// let people = db.table("people").unwrap();
///
/// let mut ann = Record::new();
/// ann.set("name", "Ann");
/// people.save(&mut ann).unwrap();
/// assert_eq!(ann.id().unwrap().to_string(), "1");
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    backend: Arc<dyn StorageBackend>,
    tables: RwLock<HashMap<String, Table>>,
    txn: Mutex<TransactionState>,
}

impl Database {
    /// Creates a database over an arbitrary storage backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                backend,
                tables: RwLock::new(HashMap::new()),
                txn: Mutex::new(TransactionState::default()),
            }),
        }
    }

    /// Opens a database persisted under a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: &Path) -> CoreResult<Self> {
        let backend = FileBackend::open(root)?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// Opens a fresh in-memory database.
    ///
    /// Data is lost when the last handle is dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Returns the table with the given name, creating its backing
    /// directory on first access.
    ///
    /// Tables are cached per name; repeated calls return the same table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WriteFailed`] if the backing directory is
    /// missing and the backend rejects its creation.
    pub fn table(&self, name: &str) -> CoreResult<Table> {
        if let Some(table) = self.inner.tables.read().get(name) {
            return Ok(table.clone());
        }
        let table = Table::new(self.clone(), name)?;
        let mut tables = self.inner.tables.write();
        Ok(tables.entry(name.to_string()).or_insert(table).clone())
    }

    /// Reads and decodes the record at `path`.
    ///
    /// While a transaction is active, a buffered value for the path wins
    /// over the backing store; a buffered delete reads as missing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if nothing exists at the path, or a
    /// codec error if the stored bytes do not decode.
    pub fn read(&self, path: &str) -> CoreResult<Record> {
        {
            let txn = self.inner.txn.lock();
            if let Some(entry) = txn.pending(path) {
                trace!(path, "read served from transaction overlay");
                return match entry {
                    Some(payload) => codec::decode(payload),
                    None => Err(CoreError::not_found(path)),
                };
            }
        }
        if !self.inner.backend.exists(path) {
            return Err(CoreError::not_found(path));
        }
        let bytes = self.inner.backend.read(path)?;
        codec::decode(&bytes)
    }

    /// Lists the record identifiers stored under a table directory.
    ///
    /// Only plain files count; subdirectories and the reserved counter
    /// file are skipped. The listing always reflects committed state -
    /// records buffered in an open transaction are invisible here until
    /// the commit flushes them.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the path is not a directory.
    pub fn read_all(&self, path: &str) -> CoreResult<Vec<String>> {
        if !self.inner.backend.is_dir(path) {
            return Err(CoreError::not_found(path));
        }
        let entries = self.inner.backend.list_dir(path)?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::File && entry.name != AUTO_INCREMENT_FILE)
            .map(|entry| entry.name)
            .collect())
    }

    /// Allocates the next identifier for the table at `table_path`.
    ///
    /// The counter lives at `<table>/.auto` and starts from zero when
    /// absent. Within a transaction the increment is buffered like any
    /// other write, and a previously buffered counter value wins over the
    /// committed one, so allocation stays monotonic across transaction
    /// boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WriteFailed`] if the backend rejects the
    /// direct counter update, or a codec error if the stored counter does
    /// not decode.
    pub fn next_id(&self, table_path: &str) -> CoreResult<i64> {
        let path = counter_path(table_path);
        let mut txn = self.inner.txn.lock();
        let current = match txn.pending(&path) {
            Some(Some(payload)) => codec::decode_counter(payload)?,
            Some(None) => 0,
            None => {
                if self.inner.backend.exists(&path) {
                    codec::decode_counter(&self.inner.backend.read(&path)?)?
                } else {
                    0
                }
            }
        };
        let next = current + 1;
        let payload = codec::encode_counter(next);
        if txn.is_active() {
            txn.record_put(path, payload);
        } else if !self.inner.backend.write(&path, &payload) {
            return Err(CoreError::write_failed(path));
        }
        Ok(next)
    }

    /// Encodes and persists a record at `path`.
    ///
    /// Within a transaction the write is buffered and always succeeds;
    /// outside one it goes straight to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WriteFailed`] if the backend rejects a direct
    /// write, or a codec error if the record does not encode.
    pub fn save(&self, path: &str, record: &Record) -> CoreResult<bool> {
        let payload = codec::encode(record)?;
        let mut txn = self.inner.txn.lock();
        if txn.is_active() {
            trace!(path, "put buffered in transaction");
            txn.record_put(path.to_string(), payload);
            return Ok(true);
        }
        drop(txn);
        if self.inner.backend.write(path, &payload) {
            Ok(true)
        } else {
            Err(CoreError::write_failed(path))
        }
    }

    /// Deletes the record at `path`.
    ///
    /// Within a transaction the delete is buffered (and masks the path
    /// from reads); outside one it goes straight to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WriteFailed`] if the backend rejects a direct
    /// deletion.
    pub fn delete(&self, path: &str) -> CoreResult<bool> {
        let mut txn = self.inner.txn.lock();
        if txn.is_active() {
            trace!(path, "delete buffered in transaction");
            txn.record_delete(path.to_string());
            return Ok(true);
        }
        drop(txn);
        if self.inner.backend.delete(path) {
            Ok(true)
        } else {
            Err(CoreError::write_failed(path))
        }
    }

    /// Opens a transaction level.
    pub fn begin(&self) {
        let mut txn = self.inner.txn.lock();
        txn.begin();
        debug!(depth = txn.depth(), "transaction begin");
    }

    /// Closes a transaction level.
    ///
    /// A nested commit only decrements the depth counter. The outermost
    /// commit replays every buffered operation against the backend in the
    /// order it was recorded, then clears all transaction state. With no
    /// transaction open, commit is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PartialCommit`] when the backend rejects one
    /// or more replayed operations. Every operation is attempted exactly
    /// once; the error lists each rejected path in replay order, and the
    /// transaction state is cleared regardless.
    pub fn commit(&self) -> CoreResult<()> {
        let mut txn = self.inner.txn.lock();
        match txn.depth() {
            0 => Ok(()),
            1 => {
                let log = txn.take_log();
                drop(txn);
                debug!(ops = log.len(), "transaction commit, flushing buffer");
                let mut failures = Vec::new();
                for op in log {
                    let applied = match &op {
                        PendingOp::Put { path, payload } => self.inner.backend.write(path, payload),
                        PendingOp::Delete { path } => self.inner.backend.delete(path),
                    };
                    if !applied {
                        warn!(path = op.path(), "backend rejected operation during commit flush");
                        failures.push(op.path().to_string());
                    }
                }
                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(CoreError::PartialCommit { failures })
                }
            }
            _ => {
                txn.release_nested();
                debug!(depth = txn.depth(), "nested commit");
                Ok(())
            }
        }
    }

    /// Discards the open transaction, if any.
    ///
    /// All buffered operations and the read overlay are dropped and the
    /// depth counter is reset, regardless of how deeply `begin` was
    /// nested. Reads fall back to the committed backend state.
    pub fn rollback(&self) {
        let mut txn = self.inner.txn.lock();
        let discarded = txn.pending_count();
        txn.clear();
        debug!(discarded, "transaction rollback");
    }

    /// Whether a transaction is currently open on this database.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.inner.txn.lock().is_active()
    }

    /// Current transaction nesting depth.
    #[must_use]
    pub fn transaction_depth(&self) -> u32 {
        self.inner.txn.lock().depth()
    }

    /// Runs a closure inside a transaction.
    ///
    /// The transaction is committed when the closure returns `Ok` and
    /// rolled back when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or the commit's.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&Database) -> CoreResult<T>,
    {
        self.begin();
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    /// Creates the directory at `path` unless it already exists.
    pub(crate) fn create_dir_if_missing(&self, path: &str) -> CoreResult<()> {
        if self.inner.backend.is_dir(path) {
            return Ok(());
        }
        if self.inner.backend.create_dir(path) {
            Ok(())
        } else {
            Err(CoreError::write_failed(path))
        }
    }
}

/// Path of the auto-increment counter for a table directory.
fn counter_path(table_path: &str) -> String {
    if table_path.ends_with('/') {
        format!("{table_path}{AUTO_INCREMENT_FILE}")
    } else {
        format!("{table_path}/{AUTO_INCREMENT_FILE}")
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.inner.tables.read().len())
            .field("transaction_depth", &self.inner.txn.lock().depth())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        let mut record = Record::new();
        for (field, value) in pairs {
            record.set(*field, value.clone());
        }
        record
    }

    fn memory_db() -> (Arc<MemoryBackend>, Database) {
        let backend = Arc::new(MemoryBackend::new());
        let db = Database::new(backend.clone());
        (backend, db)
    }

    #[test]
    fn read_decodes_backend_bytes() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/1", br#"{"id":1,"name":"Ann"}"#);

        let record = db.read("Person/1").unwrap();
        assert_eq!(record.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_backend, db) = memory_db();
        let result = db.read("Person/1");
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn read_all_skips_counter_and_directories() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.create_dir("Person/archive");
        backend.write("Person/.auto", b"3");
        backend.write("Person/1", b"{}");
        backend.write("Person/2", b"{}");
        backend.write("Person/3", b"{}");

        let ids = db.read_all("Person").unwrap();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn read_all_requires_directory() {
        let (_backend, db) = memory_db();
        let result = db.read_all("Person");
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn next_id_starts_from_one() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        assert_eq!(db.next_id("Person/").unwrap(), 1);
        assert_eq!(backend.file_contents("Person/.auto").unwrap(), b"1");
    }

    #[test]
    fn next_id_increments_stored_counter() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/.auto", b"2");
        assert_eq!(db.next_id("Person/").unwrap(), 3);
        assert_eq!(backend.file_contents("Person/.auto").unwrap(), b"3");
    }

    #[test]
    fn next_id_accepts_paths_without_trailing_slash() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        assert_eq!(db.next_id("Person").unwrap(), 1);
        assert_eq!(backend.file_contents("Person/.auto").unwrap(), b"1");
    }

    #[test]
    fn next_id_is_monotonic_across_transaction_boundaries() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        assert_eq!(db.next_id("Person/").unwrap(), 1);
        db.begin();
        assert_eq!(db.next_id("Person/").unwrap(), 2);
        assert_eq!(db.next_id("Person/").unwrap(), 3);
        db.commit().unwrap();
        assert_eq!(db.next_id("Person/").unwrap(), 4);
        assert_eq!(backend.file_contents("Person/.auto").unwrap(), b"4");
    }

    #[test]
    fn next_id_in_transaction_buffers_counter() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        db.begin();
        assert_eq!(db.next_id("Person/").unwrap(), 1);
        // Nothing hits the backend until commit.
        assert_eq!(backend.file_contents("Person/.auto"), None);
        db.commit().unwrap();
        assert_eq!(backend.file_contents("Person/.auto").unwrap(), b"1");
    }

    #[test]
    fn save_writes_through() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        let rec = record(&[("id", json!(2)), ("name", json!("Bo"))]);

        assert!(db.save("Person/2", &rec).unwrap());
        assert_eq!(
            backend.file_contents("Person/2").unwrap(),
            br#"{"id":2,"name":"Bo"}"#
        );
    }

    #[test]
    fn save_rejection_is_an_error() {
        let (backend, db) = memory_db();
        backend.create_dir("Person/2");
        let rec = record(&[("id", json!(2))]);
        let result = db.save("Person/2", &rec);
        assert!(matches!(result, Err(CoreError::WriteFailed { .. })));
    }

    #[test]
    fn delete_removes_from_backend() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/1", b"{}");
        assert!(db.delete("Person/1").unwrap());
        assert!(!backend.exists("Person/1"));
    }

    #[test]
    fn delete_rejection_is_an_error() {
        let (_backend, db) = memory_db();
        let result = db.delete("Person/1");
        assert!(matches!(result, Err(CoreError::WriteFailed { .. })));
    }

    #[test]
    fn transaction_read_sees_buffered_save() {
        let (backend, db) = memory_db();
        db.begin();
        let rec = record(&[("id", json!(1)), ("name", json!("Ann"))]);
        db.save("Person/1", &rec).unwrap();

        assert_eq!(db.read("Person/1").unwrap(), rec);
        // The backend has not been touched.
        assert_eq!(backend.file_contents("Person/1"), None);
    }

    #[test]
    fn transaction_read_sees_buffered_delete_as_missing() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/1", br#"{"id":1}"#);

        db.begin();
        db.delete("Person/1").unwrap();
        let result = db.read("Person/1");
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        // Still present underneath.
        assert!(backend.exists("Person/1"));
    }

    #[test]
    fn rollback_restores_backend_view() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/1", br#"{"id":1,"name":"Ann"}"#);

        db.begin();
        db.save("Person/1", &record(&[("id", json!(1)), ("name", json!("Zed"))]))
            .unwrap();
        db.rollback();

        let rec = db.read("Person/1").unwrap();
        assert_eq!(rec.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn rollback_of_buffered_create_reads_as_missing() {
        let (_backend, db) = memory_db();
        db.begin();
        db.save("Person/1", &record(&[("id", json!(1))])).unwrap();
        db.rollback();
        assert!(matches!(db.read("Person/1"), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn commit_flushes_operations_in_recorded_order() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        db.begin();
        db.save("Person/1", &record(&[("id", json!(1))])).unwrap();
        db.delete("Person/1").unwrap();
        db.commit().unwrap();

        // Put then delete: the record must not survive the flush.
        assert!(!backend.exists("Person/1"));
    }

    #[test]
    fn commit_applies_buffered_operations() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        db.begin();
        db.save("Person/1", &record(&[("id", json!(1)), ("n", json!(2))]))
            .unwrap();
        db.commit().unwrap();

        assert_eq!(
            backend.file_contents("Person/1").unwrap(),
            br#"{"id":1,"n":2}"#
        );
        assert!(!db.in_transaction());
    }

    #[test]
    fn nested_commit_keeps_transaction_open() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        db.begin();
        db.begin();
        db.save("Person/1", &record(&[("id", json!(1))])).unwrap();
        db.commit().unwrap();

        // Inner commit only unwinds one level; the buffer is still pending.
        assert!(db.in_transaction());
        assert_eq!(db.transaction_depth(), 1);
        assert_eq!(backend.file_contents("Person/1"), None);
        assert!(db.read("Person/1").is_ok());

        db.commit().unwrap();
        assert!(backend.exists("Person/1"));
    }

    #[test]
    fn rollback_discards_at_any_depth() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        backend.write("Person/1", br#"{"id":1,"name":"Ann"}"#);

        db.begin();
        db.begin();
        db.save("Person/1", &record(&[("id", json!(1)), ("name", json!("Zed"))]))
            .unwrap();
        db.rollback();

        assert!(!db.in_transaction());
        assert_eq!(
            db.read("Person/1").unwrap().get("name"),
            Some(&json!("Ann"))
        );
    }

    #[test]
    fn commit_without_transaction_is_a_noop() {
        let (_backend, db) = memory_db();
        db.commit().unwrap();
        assert!(!db.in_transaction());
    }

    #[test]
    fn partial_commit_reports_rejected_paths_and_applies_the_rest() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");
        // A directory squatting on the record path rejects the replayed put.
        backend.create_dir("Person/2");

        db.begin();
        db.save("Person/1", &record(&[("id", json!(1))])).unwrap();
        db.save("Person/2", &record(&[("id", json!(2))])).unwrap();
        db.save("Person/3", &record(&[("id", json!(3))])).unwrap();
        let result = db.commit();

        match result {
            Err(CoreError::PartialCommit { failures }) => {
                assert_eq!(failures, vec!["Person/2".to_string()]);
            }
            other => panic!("expected PartialCommit, got {other:?}"),
        }
        // Operations around the rejected one were still attempted.
        assert!(backend.exists("Person/1"));
        assert!(backend.exists("Person/3"));
        // State is cleared even after a partial flush.
        assert!(!db.in_transaction());
    }

    #[test]
    fn transaction_closure_commits_on_ok() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        db.transaction(|db| db.save("Person/1", &record(&[("id", json!(1))])))
            .unwrap();

        assert!(backend.exists("Person/1"));
        assert!(!db.in_transaction());
    }

    #[test]
    fn transaction_closure_rolls_back_on_err() {
        let (backend, db) = memory_db();
        backend.create_dir("Person");

        let result: CoreResult<()> = db.transaction(|db| {
            db.save("Person/1", &record(&[("id", json!(1))]))?;
            Err(CoreError::not_found("boom"))
        });

        assert!(result.is_err());
        assert!(!db.in_transaction());
        assert!(!backend.exists("Person/1"));
    }

    #[test]
    fn table_handles_are_cached_by_name() {
        let (backend, db) = memory_db();
        db.table("Person").unwrap();
        assert!(backend.is_dir("Person/"));

        // A cached table is returned as-is: wiping the backend shows the
        // directory is not re-created on the second access.
        backend.clear();
        db.table("Person").unwrap();
        assert!(!backend.exists("Person/"));
    }

    #[test]
    fn table_creation_failure_is_an_error() {
        let (backend, db) = memory_db();
        // A file squatting on the table path rejects directory creation.
        backend.write("Person", b"oops");
        let result = db.table("Person");
        assert!(matches!(result, Err(CoreError::WriteFailed { .. })));
    }
}
