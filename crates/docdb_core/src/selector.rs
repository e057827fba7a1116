//! Query selectors.

use crate::record::{Record, RecordId};
use serde_json::Value;
use std::fmt;

/// Describes which records a query targets.
///
/// The three query modes are explicit variants rather than being inferred
/// from the shape of an argument:
///
/// - [`Selector::Id`] - exact identifier lookup
/// - [`Selector::Equals`] - every listed field must exist and strictly
///   equal the expected value
/// - [`Selector::Predicate`] - arbitrary caller-supplied match function
///
/// [`Selector::All`] matches every record and is what an empty equality
/// map degenerates to.
///
/// # Example
///
/// ```rust
/// use docdb_core::Selector;
///
/// let by_id = Selector::id(3);
/// let by_field = Selector::equals([("name", "Ann")]);
/// let by_rule = Selector::predicate(|record| record.get("age").is_some());
/// # let _ = (by_id, by_field, by_rule);
/// ```
pub enum Selector {
    /// Matches every record.
    All,
    /// Matches the record with exactly this identifier.
    Id(RecordId),
    /// Matches records where every listed field exists and equals the
    /// expected value. A missing field or an unequal value disqualifies.
    Equals(Vec<(String, Value)>),
    /// Matches records for which the function returns `true`.
    Predicate(Box<dyn Fn(&Record) -> bool>),
}

impl Selector {
    /// Creates an identifier selector.
    pub fn id(id: impl Into<RecordId>) -> Self {
        Self::Id(id.into())
    }

    /// Creates an equality selector from field/value pairs.
    pub fn equals<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Equals(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Creates a predicate selector from a match function.
    pub fn predicate(f: impl Fn(&Record) -> bool + 'static) -> Self {
        Self::Predicate(Box::new(f))
    }

    /// Checks whether a record matches this selector.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => record.id().as_ref() == Some(id),
            Self::Equals(pairs) => pairs
                .iter()
                .all(|(field, expected)| record.get(field) == Some(expected)),
            Self::Predicate(f) => f(record),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Equals(pairs) => f.debug_tuple("Equals").field(pairs).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<RecordId> for Selector {
    fn from(id: RecordId) -> Self {
        Self::Id(id)
    }
}

impl From<i64> for Selector {
    fn from(id: i64) -> Self {
        Self::Id(id.into())
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Self::Id(id.into())
    }
}
