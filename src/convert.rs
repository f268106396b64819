//! Data Converter - recursive mapping between record values and store values.
//!
//! Writes go through [`to_store_format`], reads through [`of_document_snapshot`]
//! (which applies [`to_native_format`] on request) and finally
//! [`from_document`] into the record type.

use serde::de::DeserializeOwned;

use crate::store::DocumentSnapshot;
use crate::value::{self, Document, Value};

/// Field the store-assigned identifier is written to on read.
pub const ID_FIELD: &str = "id";

/// Prepare a value for a write.
///
/// Keyed structures keep only the keys that were set: [`Value::Absent`] entries
/// are dropped while [`Value::Null`] entries are kept, so "leave untouched" and
/// "clear" stay distinct. An absent element inside a sequence has no key to drop
/// and becomes null. Every other kind is returned as is.
pub fn to_store_format(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match to_store_format(item) {
                    Value::Absent => Value::Null,
                    converted => converted,
                })
                .collect(),
        ),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .filter(|(_, value)| !value.is_absent())
                .map(|(key, value)| (key, to_store_format(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Turn store timestamps back into native dates, recursing through sequences
/// and keyed structures. References are kept as references.
pub fn to_native_format(value: Value) -> Value {
    match value {
        Value::Timestamp(ts) => ts
            .to_date_time()
            .map(Value::Date)
            .unwrap_or(Value::Timestamp(ts)),
        Value::Array(items) => Value::Array(items.into_iter().map(to_native_format).collect()),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| (key, to_native_format(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Build the record body for a snapshot: stored fields plus the identifier
/// under [`ID_FIELD`]. The store-assigned identifier replaces any stored `id`.
pub fn of_document_snapshot(snapshot: DocumentSnapshot, convert_timestamps: bool) -> Document {
    let (id, data) = snapshot.into_parts();
    let mut document = data.unwrap_or_default();
    document.insert(ID_FIELD.to_string(), Value::String(id));

    if !convert_timestamps {
        return document;
    }

    document
        .into_iter()
        .map(|(key, value)| (key, to_native_format(value)))
        .collect()
}

/// Decode a converted document into a record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, value::Error> {
    value::from_value(Value::Map(document))
}
