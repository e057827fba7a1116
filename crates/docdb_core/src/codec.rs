//! JSON encoding and decoding of records.
//!
//! Records are stored as plain JSON objects. Field order is preserved on
//! both sides, so encode/decode is lossless field-for-field. The
//! auto-increment counter is stored as a bare JSON integer.

use crate::error::CoreResult;
use crate::record::Record;

/// Encodes a record to JSON bytes.
///
/// # Errors
///
/// Returns a codec error if a field value cannot be represented in JSON
/// (e.g. a non-finite float).
pub fn encode(record: &Record) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Decodes a record from JSON bytes.
///
/// # Errors
///
/// Returns a codec error if the bytes are not a JSON object. Stored bytes
/// that fail to decode are a defect in the backing store.
pub fn decode(bytes: &[u8]) -> CoreResult<Record> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes an auto-increment counter value.
pub(crate) fn encode_counter(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decodes an auto-increment counter value.
pub(crate) fn decode_counter(bytes: &[u8]) -> CoreResult<i64> {
    Ok(serde_json::from_slice(bytes)?)
}
