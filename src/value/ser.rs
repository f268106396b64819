//! Serde serializer producing a [`Value`] tree.

use chrono::{DateTime, Utc};
use serde::ser::{self, Serialize};
use thiserror::Error;

use super::{
    Document, DocumentRef, FieldValue, Timestamp, Value, ABSENT_TOKEN, DATE_TOKEN,
    REFERENCE_TOKEN, SENTINEL_TOKEN, TIMESTAMP_TOKEN,
};

/// Error raised while turning a payload into a [`Value`] or a [`Value`] back
/// into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),
    #[error("map key must be a string, integer or boolean, got {0}")]
    KeyMustBeString(&'static str),
    #[error("integer {0} does not fit in a signed 64-bit value")]
    IntegerOutOfRange(u64),
    #[error("invalid {kind}: {value}")]
    InvalidMarker { kind: &'static str, value: String },
}

impl ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// Serialize any `T: Serialize` into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    value.serialize(ValueSerializer)
}

/// Serializer whose output is a [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::IntegerOutOfRange(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        Ok(Value::Double(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, Error> {
        if name == ABSENT_TOKEN {
            Ok(Value::Absent)
        } else {
            Ok(Value::Null)
        }
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        let inner = value.serialize(self)?;
        match name {
            DATE_TOKEN => marker_text(&inner, "date").and_then(|text| {
                DateTime::parse_from_rfc3339(text)
                    .map(|date| Value::Date(date.with_timezone(&Utc)))
                    .map_err(|_| invalid("date", text))
            }),
            REFERENCE_TOKEN => {
                marker_text(&inner, "reference").map(|path| Value::Reference(DocumentRef::new(path)))
            }
            SENTINEL_TOKEN => marker_text(&inner, "sentinel").and_then(|encoded| {
                FieldValue::decode(encoded)
                    .map(Value::Sentinel)
                    .ok_or_else(|| invalid("sentinel", encoded))
            }),
            _ => Ok(inner),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        let mut map = Document::new();
        map.insert(variant.to_string(), to_value(value)?);
        Ok(Value::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec, Error> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeVec, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, Error> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap, Error> {
        Ok(SerializeMap {
            map: Document::new(),
            next_key: None,
            timestamp: false,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<SerializeMap, Error> {
        Ok(SerializeMap {
            map: Document::new(),
            next_key: None,
            timestamp: name == TIMESTAMP_TOKEN,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant, Error> {
        Ok(SerializeStructVariant {
            variant,
            map: Document::new(),
        })
    }
}

fn marker_text<'a>(inner: &'a Value, kind: &'static str) -> Result<&'a str, Error> {
    inner.as_str().ok_or_else(|| Error::InvalidMarker {
        kind,
        value: inner.kind().to_string(),
    })
}

fn invalid(kind: &'static str, value: &str) -> Error {
    Error::InvalidMarker {
        kind,
        value: value.to_string(),
    }
}

pub struct SerializeVec {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut map = Document::new();
        map.insert(self.variant.to_string(), Value::Array(self.items));
        Ok(Value::Map(map))
    }
}

pub struct SerializeMap {
    map: Document,
    next_key: Option<String>,
    timestamp: bool,
}

impl SerializeMap {
    fn into_timestamp(self) -> Result<Value, Error> {
        let seconds = self.map.get("seconds").and_then(Value::as_i64);
        let nanoseconds = self
            .map
            .get("nanoseconds")
            .and_then(Value::as_i64)
            .and_then(|n| u32::try_from(n).ok());

        match (seconds, nanoseconds) {
            (Some(seconds), Some(nanoseconds)) => {
                Ok(Value::Timestamp(Timestamp::new(seconds, nanoseconds)))
            }
            _ => Err(invalid("timestamp", &format!("{:?}", self.map))),
        }
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
        self.next_key = Some(key_to_string(to_value(key)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::Custom("serialize_value called before serialize_key".into()))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Map(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        if self.timestamp {
            self.into_timestamp()
        } else {
            Ok(Value::Map(self.map))
        }
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    map: Document,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut outer = Document::new();
        outer.insert(self.variant.to_string(), Value::Map(self.map));
        Ok(Value::Map(outer))
    }
}

fn key_to_string(key: Value) -> Result<String, Error> {
    match key {
        Value::String(s) => Ok(s),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        other => Err(Error::KeyMustBeString(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Profile {
        display_name: String,
        tags: Vec<&'static str>,
        address: Address,
        score: Option<f64>,
        status: Status,
        counters: HashMap<u8, u32>,
    }

    #[derive(Serialize)]
    struct Address {
        city: String,
    }

    #[derive(Serialize)]
    enum Status {
        Active,
        Suspended { reason: String },
    }

    #[test]
    fn structs_become_maps() {
        let profile = Profile {
            display_name: "Ana".into(),
            tags: vec!["a", "b"],
            address: Address {
                city: "Recife".into(),
            },
            score: None,
            status: Status::Active,
            counters: HashMap::from([(1, 10)]),
        };

        let value = to_value(&profile).unwrap();

        assert_eq!(value.get("displayName"), Some(&Value::from("Ana")));
        assert_eq!(value.get("tags"), Some(&Value::from(vec!["a", "b"])));
        assert_eq!(value.get_path("address.city"), Some(&Value::from("Recife")));
        assert_eq!(value.get("score"), Some(&Value::Null));
        assert_eq!(value.get("status"), Some(&Value::from("Active")));
        assert_eq!(value.get_path("counters.1"), Some(&Value::Integer(10)));
    }

    #[test]
    fn struct_variants_are_keyed_by_variant() {
        let value = to_value(&Status::Suspended {
            reason: "spam".into(),
        })
        .unwrap();
        assert_eq!(value.get_path("Suspended.reason"), Some(&Value::from("spam")));
    }

    #[test]
    fn markers_round_trip_through_value() {
        let ts = Timestamp::new(100, 5);
        let reference = DocumentRef::from_parts("users", "u1");
        let sentinel = FieldValue::increment(2);

        assert_eq!(to_value(&ts).unwrap(), Value::Timestamp(ts));
        assert_eq!(
            to_value(&reference).unwrap(),
            Value::Reference(reference.clone())
        );
        assert_eq!(to_value(&sentinel).unwrap(), Value::Sentinel(sentinel));
    }

    #[test]
    fn value_serializes_to_itself() {
        let mut doc = Document::new();
        doc.insert("a".into(), Value::Absent);
        doc.insert("b".into(), Value::Date(Utc::now()));
        doc.insert("c".into(), Value::Sentinel(FieldValue::ServerTimestamp));
        let value = Value::Map(doc);

        assert_eq!(to_value(&value).unwrap(), value);
    }

    #[test]
    fn huge_unsigned_is_rejected() {
        assert_eq!(to_value(&u64::MAX), Err(Error::IntegerOutOfRange(u64::MAX)));
    }

    #[test]
    fn non_scalar_keys_are_rejected() {
        let map = HashMap::from([((1, 2), "x")]);
        assert!(matches!(to_value(&map), Err(Error::KeyMustBeString("array"))));
    }
}
