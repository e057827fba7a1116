//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records and table names
//! that maintain required invariants.

use docdb_core::Record;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating valid table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,31}").expect("invalid regex")
}

/// Strategy for generating field names.
///
/// The reserved `id` field is excluded; tests add identifiers
/// deliberately.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("invalid regex")
        .prop_filter("id is reserved", |name| name != "id")
}

/// Strategy for generating scalar JSON values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::from),
    ]
}

/// Strategy for generating records without an identifier.
///
/// Saving such a record exercises the auto-increment path.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec((field_name_strategy(), scalar_value_strategy()), 0..8).prop_map(
        |pairs| {
            let mut record = Record::new();
            for (field, value) in pairs {
                record.set(field, value);
            }
            record
        },
    )
}
