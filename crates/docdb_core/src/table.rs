//! Tables: collection-level query, save, and delete logic.

use crate::database::Database;
use crate::error::CoreResult;
use crate::record::{Record, RecordId};
use crate::selector::Selector;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named collection of records backed by one directory.
///
/// Tables are built purely on [`Database`] primitives and carry no storage
/// knowledge of their own. A table is obtained from [`Database::table`],
/// which creates the backing directory on first access and caches the
/// handle per name. Handles are cheap to clone.
///
/// Scans walk the identifiers returned by the directory listing, so their
/// order follows the backend's listing order (sorted by name for the
/// shipped backends).
///
/// # Example
///
/// ```rust
/// use docdb_core::{Database, Record, Selector};
///
/// let db = Database::in_memory();
/// let people = db.table("people").unwrap();
///
/// let mut ann = Record::new();
/// ann.set("name", "Ann");
/// people.save(&mut ann).unwrap();
///
/// let found = people.find(Selector::equals([("name", "Ann")])).unwrap();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Clone)]
pub struct Table {
    db: Database,
    name: Arc<str>,
    path: Arc<str>,
}

impl Table {
    /// Creates a table handle, ensuring the backing directory exists.
    pub(crate) fn new(db: Database, name: &str) -> CoreResult<Self> {
        let trimmed = name.trim_end_matches('/');
        let path = format!("{trimmed}/");
        db.create_dir_if_missing(&path)?;
        Ok(Self {
            db,
            name: Arc::from(trimmed),
            path: Arc::from(path.as_str()),
        })
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's directory path, with a trailing slash.
    #[must_use]
    pub fn dir_path(&self) -> &str {
        &self.path
    }

    fn record_path(&self, id: impl fmt::Display) -> String {
        format!("{}{id}", self.path)
    }

    /// Finds all records matching a selector, keyed by identifier.
    ///
    /// An identifier selector reads the record directly and returns it as
    /// a single-entry map. The other selectors scan every identifier in
    /// the table, load each record, and keep the matches; no matches
    /// yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] when an identifier selector
    /// names a missing record, or when the table directory itself is
    /// missing.
    pub fn find(&self, selector: Selector) -> CoreResult<BTreeMap<String, Record>> {
        match selector {
            Selector::Id(id) => {
                let record = self.db.read(&self.record_path(&id))?;
                let mut results = BTreeMap::new();
                results.insert(id.to_string(), record);
                Ok(results)
            }
            selector => {
                let mut results = BTreeMap::new();
                for id in self.db.read_all(&self.path)? {
                    let record = self.db.read(&self.record_path(&id))?;
                    if selector.matches(&record) {
                        results.insert(id, record);
                    }
                }
                Ok(results)
            }
        }
    }

    /// Finds the first record matching a selector, in scan order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] when nothing matches.
    pub fn find_first(&self, selector: Selector) -> CoreResult<Record> {
        match selector {
            Selector::Id(id) => self.db.read(&self.record_path(&id)),
            selector => {
                for id in self.db.read_all(&self.path)? {
                    let record = self.db.read(&self.record_path(&id))?;
                    if selector.matches(&record) {
                        return Ok(record);
                    }
                }
                Err(crate::CoreError::not_found(self.path.as_ref()))
            }
        }
    }

    /// Saves a record, assigning a fresh identifier when it lacks a valid
    /// one.
    ///
    /// A record whose `id` field is missing, or holds anything other than
    /// a string or an integer, receives the next value from the table's
    /// auto-increment counter; the record is updated in place. The record
    /// is then persisted at `<table>/<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::WriteFailed`] when the backend rejects
    /// the write (or the counter update) outside a transaction.
    pub fn save(&self, record: &mut Record) -> CoreResult<bool> {
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = RecordId::Int(self.db.next_id(&self.path)?);
                record.set_id(id.clone());
                id
            }
        };
        self.db.save(&self.record_path(&id), record)
    }

    /// Deletes all records matching a selector.
    ///
    /// Returns the per-identifier outcome: `true` when the backend
    /// accepted the deletion, `false` when it rejected it. An individual
    /// rejection never raises. An empty match - including an identifier
    /// selector naming a missing record - means nothing to delete and
    /// yields an empty map.
    ///
    /// # Errors
    ///
    /// Propagates scan failures other than not-found.
    pub fn delete(&self, selector: Selector) -> CoreResult<BTreeMap<String, bool>> {
        let matched = match self.find(selector) {
            Ok(matched) => matched,
            Err(err) if err.is_not_found() => BTreeMap::new(),
            Err(err) => return Err(err),
        };

        let mut outcomes = BTreeMap::new();
        for id in matched.keys() {
            let deleted = self.db.delete(&self.record_path(id)).is_ok();
            outcomes.insert(id.clone(), deleted);
        }
        Ok(outcomes)
    }

    /// Visits every record in the table for side effects.
    ///
    /// The visitor receives the table handle and each record in scan
    /// order, and may rewrite records through [`Table::save`]. Its return
    /// value is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::NotFound`] when the table directory is
    /// missing, or a read error for an undecodable record.
    pub fn repair<F>(&self, mut visitor: F) -> CoreResult<()>
    where
        F: FnMut(&Table, Record),
    {
        for id in self.db.read_all(&self.path)? {
            let record = self.db.read(&self.record_path(&id))?;
            visitor(self, record);
        }
        Ok(())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}
