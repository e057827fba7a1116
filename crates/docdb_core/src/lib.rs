//! # docdb Core
//!
//! Core document store engine for docdb.
//!
//! This crate provides:
//! - [`Database`] - the storage choke point, with an in-process
//!   transaction buffer and per-table identifier allocation
//! - [`Table`] - collection-level queries, saves, deletes, and repair
//! - [`Record`] / [`RecordId`] - ordered JSON documents and their
//!   identifiers
//! - [`Selector`] - the three query modes (by id, by equality, by
//!   predicate) as an explicit variant type
//! - [`codec`] - the JSON record encoding
//!
//! Storage itself lives behind the
//! [`StorageBackend`](docdb_storage::StorageBackend) trait from
//! `docdb_storage`; any path-addressed byte store satisfying it is
//! interchangeable.
//!
//! ## Example
//!
//! ```rust
//! use docdb_core::{Database, Record, Selector};
//!
//! let db = Database::in_memory();
//! let people = db.table("people")?;
//!
//! let mut ann = Record::new();
//! ann.set("name", "Ann");
//! people.save(&mut ann)?;
//!
//! db.begin();
//! let mut bo = Record::new();
//! bo.set("name", "Bo");
//! people.save(&mut bo)?;
//! db.rollback();
//!
//! // Ann committed, Bo was rolled back.
//! assert_eq!(people.find(Selector::All)?.len(), 1);
//! # Ok::<(), docdb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod database;
mod error;
mod record;
mod selector;
mod table;
mod transaction;

pub use database::{Database, AUTO_INCREMENT_FILE};
pub use error::{CoreError, CoreResult};
pub use record::{Record, RecordId};
pub use selector::Selector;
pub use table::Table;

pub use serde_json::Value;
