//! Values - the closed set of value kinds that flow between records and the store.
//!
//! Records are turned into a [`Value`] tree with [`to_value`], converted with the
//! functions in [`crate::convert`], and handed to a [`DocumentStore`](crate::DocumentStore)
//! as a [`Document`]. Reads go the other way, ending in [`from_value`].
//!
//! ## Example
//!
//! ```ignore
//! use document_repo::{to_value, Field, Value};
//!
//! #[derive(Serialize)]
//! struct Patch {
//!     nickname: Field<String>,
//!     #[serde(with = "document_repo::date")]
//!     birth_date: DateTime<Utc>,
//! }
//!
//! let value = to_value(&patch)?;
//! assert!(matches!(value.get("birth_date"), Some(Value::Date(_))));
//! ```

pub mod date;
mod de;
mod field;
mod ser;
mod timestamp;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

pub use de::from_value;
pub use field::Field;
pub use ser::{to_value, Error, ValueSerializer};
pub use timestamp::Timestamp;

// Marker names recognized by `ValueSerializer`. Other serializers see plain
// newtypes/structs and fall back to the inner representation.
pub(crate) const ABSENT_TOKEN: &str = "$__document_repo_private_absent";
pub(crate) const DATE_TOKEN: &str = "$__document_repo_private_date";
pub(crate) const TIMESTAMP_TOKEN: &str = "$__document_repo_private_timestamp";
pub(crate) const REFERENCE_TOKEN: &str = "$__document_repo_private_reference";
pub(crate) const SENTINEL_TOKEN: &str = "$__document_repo_private_sentinel";

/// The body of a stored document: field name to value.
pub type Document = BTreeMap<String, Value>;

/// A single value inside a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Never set. Dropped from keyed structures on the way to the store.
    #[default]
    Absent,
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// A native date.
    Date(DateTime<Utc>),
    /// A store-native timestamp, as read back from the store.
    Timestamp(Timestamp),
    /// A pointer to another document. Never followed.
    Reference(DocumentRef),
    /// A value the store computes at commit time.
    Sentinel(FieldValue),
    Array(Vec<Value>),
    Map(Document),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Reference(_) => "reference",
            Value::Sentinel(_) => "sentinel",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a top-level key of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Look up a dotted field path (`"address.city"`) through nested maps.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Convert into plain JSON for decoding into records.
    ///
    /// Dates become RFC 3339 strings, timestamps become `{seconds, nanoseconds}`,
    /// references become their path, sentinels become null and absent keys are
    /// dropped. JSON has no NaN or infinity, so non-finite doubles become null;
    /// decode records with [`from_value`] instead.
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Absent | Value::Null | Value::Sentinel(_) => Json::Null,
            Value::Boolean(b) => Json::Bool(b),
            Value::Integer(n) => Json::from(n),
            Value::Double(n) => serde_json::Number::from_f64(n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s),
            Value::Bytes(bytes) => Json::Array(bytes.into_iter().map(Json::from).collect()),
            Value::Date(date) => Json::String(date::format(&date)),
            Value::Timestamp(ts) => serde_json::json!({
                "seconds": ts.seconds(),
                "nanoseconds": ts.nanoseconds(),
            }),
            Value::Reference(reference) => Json::String(reference.path),
            Value::Array(items) => Json::Array(items.into_iter().map(Value::into_json).collect()),
            Value::Map(map) => Json::Object(
                map.into_iter()
                    .filter(|(_, value)| !value.is_absent())
                    .map(|(key, value)| (key, value.into_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Absent => serializer.serialize_unit_struct(ABSENT_TOKEN),
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Double(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::Date(value) => date::serialize(value, serializer),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::Reference(reference) => reference.serialize(serializer),
            Value::Sentinel(sentinel) => sentinel.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<DocumentRef> for Value {
    fn from(value: DocumentRef) -> Self {
        Value::Reference(value)
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        Value::Sentinel(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Path of a document inside the store, `"collection/id"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub struct DocumentRef {
    path: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_parts(collection: &str, id: &str) -> Self {
        Self::new(format!("{}/{}", collection, id))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Everything before the last path segment.
    pub fn parent(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }
}

impl From<String> for DocumentRef {
    fn from(path: String) -> Self {
        Self { path }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl Serialize for DocumentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(REFERENCE_TOKEN, &self.path)
    }
}

/// Numeric operand of [`FieldValue::Increment`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Double(f64),
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Numeric::Integer(i64::from(value))
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Double(value)
    }
}

impl std::ops::Neg for Numeric {
    type Output = Numeric;

    fn neg(self) -> Self::Output {
        match self {
            Numeric::Integer(n) => Numeric::Integer(n.wrapping_neg()),
            Numeric::Double(n) => Numeric::Double(-n),
        }
    }
}

/// Write-only values resolved by the store when the write commits.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// The store's clock at commit time.
    ServerTimestamp,
    /// Add to the current numeric value; a missing or non-numeric field takes
    /// the operand itself.
    Increment(Numeric),
    /// Remove the field. Only valid in updates and merges.
    Delete,
}

impl FieldValue {
    pub fn server_timestamp() -> Self {
        FieldValue::ServerTimestamp
    }

    pub fn increment(by: impl Into<Numeric>) -> Self {
        FieldValue::Increment(by.into())
    }

    pub fn decrement(by: impl Into<Numeric>) -> Self {
        FieldValue::Increment(-by.into())
    }

    pub fn delete() -> Self {
        FieldValue::Delete
    }

    fn encode(&self) -> String {
        match self {
            FieldValue::ServerTimestamp => "serverTimestamp".to_string(),
            FieldValue::Increment(Numeric::Integer(n)) => format!("increment:i:{}", n),
            FieldValue::Increment(Numeric::Double(n)) => format!("increment:d:{}", n),
            FieldValue::Delete => "delete".to_string(),
        }
    }

    pub(crate) fn decode(encoded: &str) -> Option<Self> {
        match encoded {
            "serverTimestamp" => Some(FieldValue::ServerTimestamp),
            "delete" => Some(FieldValue::Delete),
            other => {
                let operand = other.strip_prefix("increment:")?;
                match operand.split_once(':')? {
                    ("i", n) => n.parse().ok().map(|n| FieldValue::Increment(Numeric::Integer(n))),
                    ("d", n) => n.parse().ok().map(|n| FieldValue::Increment(Numeric::Double(n))),
                    _ => None,
                }
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(SENTINEL_TOKEN, &self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_encoding_survives_decode() {
        for sentinel in [
            FieldValue::server_timestamp(),
            FieldValue::delete(),
            FieldValue::increment(3),
            FieldValue::decrement(2),
            FieldValue::increment(0.5),
        ] {
            assert_eq!(FieldValue::decode(&sentinel.encode()), Some(sentinel));
        }
        assert_eq!(FieldValue::decode("increment:x:1"), None);
    }

    #[test]
    fn decrement_negates_operand() {
        assert_eq!(
            FieldValue::decrement(1),
            FieldValue::Increment(Numeric::Integer(-1))
        );
    }

    #[test]
    fn document_ref_parts() {
        let reference = DocumentRef::from_parts("users", "abc");
        assert_eq!(reference.path(), "users/abc");
        assert_eq!(reference.id(), "abc");
        assert_eq!(reference.parent(), Some("users"));
    }

    #[test]
    fn get_path_walks_nested_maps() {
        let mut address = Document::new();
        address.insert("city".into(), Value::from("Recife"));
        let mut root = Document::new();
        root.insert("address".into(), Value::Map(address));
        let value = Value::Map(root);

        assert_eq!(value.get_path("address.city"), Some(&Value::from("Recife")));
        assert_eq!(value.get_path("address.zip"), None);
    }

    #[test]
    fn into_json_drops_absent_keys_and_formats_dates() {
        let date = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut doc = Document::new();
        doc.insert("gone".into(), Value::Absent);
        doc.insert("cleared".into(), Value::Null);
        doc.insert("at".into(), Value::Date(date));

        let json = Value::Map(doc).into_json();
        assert_eq!(
            json,
            serde_json::json!({ "cleared": null, "at": "2024-03-01T10:00:00Z" })
        );
    }
}
