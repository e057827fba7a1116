//! Record and record identifier types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The reserved field every persisted record carries.
pub(crate) const ID_FIELD: &str = "id";

/// Identifier of a persisted record.
///
/// Identifiers are either integers (allocated by the per-table counter) or
/// caller-supplied strings. The `Display` form is the record's basename
/// under its table directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// Integer identifier, as allocated by the auto-increment counter.
    Int(i64),
    /// String identifier supplied by the caller.
    Text(String),
}

impl RecordId {
    /// Extracts an identifier from a JSON value.
    ///
    /// Only strings and integral numbers qualify; any other value is
    /// treated as "no identifier" and replaced at save time.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }

    /// Returns the identifier as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// One persisted document: an ordered mapping from field names to JSON
/// values.
///
/// Field order is preserved through encode/decode, so a record read back
/// reproduces what was saved field-for-field. Once persisted, a record
/// always carries an `id` field (see [`Record::id`]).
///
/// # Example
///
/// ```rust
/// use docdb_core::Record;
///
/// let mut record = Record::new();
/// record.set("name", "Ann");
/// record.set("age", 34);
/// assert!(record.id().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Checks whether a field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns the record's identifier, if it carries a valid one.
    ///
    /// Only a string or an integral number in the `id` field counts;
    /// anything else is treated as absent.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID_FIELD).and_then(RecordId::from_value)
    }

    /// Sets the record's identifier.
    pub fn set_id(&mut self, id: RecordId) {
        self.fields.insert(ID_FIELD.to_string(), id.to_value());
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
