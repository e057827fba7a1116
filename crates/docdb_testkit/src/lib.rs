//! # docdb Testkit
//!
//! Test utilities for docdb.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A failure-injecting backend wrapper for exercising write-rejection
//!   paths
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         let table = db.table("test").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod inject;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::inject::*;
}

pub use fixtures::*;
pub use generators::*;
pub use inject::*;
