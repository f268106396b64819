//! Serde deserializer reading records straight out of a [`Value`] tree.
//!
//! Dates are handed to visitors as RFC 3339 strings, timestamps as a
//! `{seconds, nanoseconds}` map and references as their path. Doubles keep
//! their exact value, including NaN and infinities.

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::{date, Error, Value};

impl de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// Deserialize a `T` from a [`Value`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(value)
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

fn visit_array<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, Error> {
    let mut seq: SeqDeserializer<_, Error> = SeqDeserializer::new(items.into_iter());
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

fn visit_entries<'de, V, I>(entries: I, visitor: V) -> Result<V::Value, Error>
where
    V: Visitor<'de>,
    I: Iterator<Item = (String, Value)>,
{
    let mut map: MapDeserializer<'de, _, Error> =
        MapDeserializer::new(entries.filter(|(_, value)| !value.is_absent()));
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Value::Absent | Value::Null | Value::Sentinel(_) => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(n) => visitor.visit_i64(n),
            Value::Double(n) => visitor.visit_f64(n),
            Value::String(s) => visitor.visit_string(s),
            Value::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Value::Date(value) => visitor.visit_string(date::format(&value)),
            Value::Timestamp(ts) => visit_entries(
                [
                    ("seconds".to_string(), Value::Integer(ts.seconds())),
                    (
                        "nanoseconds".to_string(),
                        Value::Integer(i64::from(ts.nanoseconds())),
                    ),
                ]
                .into_iter(),
                visitor,
            ),
            Value::Reference(reference) => visitor.visit_string(reference.path().to_string()),
            Value::Array(items) => visit_array(items, visitor),
            Value::Map(map) => visit_entries(map.into_iter(), visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Value::Absent | Value::Null | Value::Sentinel(_) => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) => {
                let mut entries = map.into_iter().filter(|(_, value)| !value.is_absent());
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    _ => Err(de::Error::invalid_value(
                        de::Unexpected::Map,
                        &"a map with a single key",
                    )),
                }
            }
            other => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.kind()),
                &"a string or a single-key map",
            )),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Self::Variant), Error> {
        let variant: StringDeserializer<Error> = self.variant.into_deserializer();
        let tag = seed.deserialize(variant)?;
        Ok((tag, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.kind()),
                &"a unit variant",
            )),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Error> {
        match self.value {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"a newtype variant",
            )),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Some(Value::Array(items)) => visit_array(items, visitor),
            _ => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"a tuple variant",
            )),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Some(Value::Map(map)) => visit_entries(map.into_iter(), visitor),
            _ => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &"a struct variant",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    use super::*;
    use crate::value::{Document, DocumentRef, Timestamp};

    #[derive(Debug, PartialEq, Deserialize)]
    enum Shape {
        Circle(f64),
        Square { side: i64 },
        Dot,
    }

    #[derive(Debug, Deserialize)]
    struct Reading {
        value: f64,
        shape: Shape,
        #[serde(default)]
        note: Option<String>,
        owner: DocumentRef,
        #[serde(with = "crate::value::date")]
        at: DateTime<Utc>,
        #[serde(with = "crate::value::date")]
        stored_at: DateTime<Utc>,
    }

    fn reading(value: f64) -> Value {
        let at = DateTime::from_timestamp(1_700_000_000, 5).unwrap();
        let side = Document::from([("side".to_string(), Value::Integer(3))]);
        let shape = Document::from([("Square".to_string(), Value::Map(side))]);

        let mut map = Document::new();
        map.insert("value".into(), Value::Double(value));
        map.insert("shape".into(), Value::Map(shape));
        map.insert("note".into(), Value::Null);
        map.insert("skipped".into(), Value::Absent);
        map.insert(
            "owner".into(),
            Value::Reference(DocumentRef::from_parts("users", "u1")),
        );
        map.insert("at".into(), Value::Date(at));
        map.insert("stored_at".into(), Value::Timestamp(Timestamp::from(at)));
        Value::Map(map)
    }

    #[test]
    fn non_finite_doubles_survive() {
        let nan: Reading = from_value(reading(f64::NAN)).unwrap();
        assert!(nan.value.is_nan());

        let inf: Reading = from_value(reading(f64::INFINITY)).unwrap();
        assert_eq!(inf.value, f64::INFINITY);

        let neg: Reading = from_value(reading(f64::NEG_INFINITY)).unwrap();
        assert_eq!(neg.value, f64::NEG_INFINITY);
    }

    #[test]
    fn decodes_store_kinds() {
        let decoded: Reading = from_value(reading(1.5)).unwrap();
        assert_eq!(decoded.shape, Shape::Square { side: 3 });
        assert_eq!(decoded.note, None);
        assert_eq!(decoded.owner.path(), "users/u1");
        assert_eq!(decoded.at, decoded.stored_at);
    }

    #[test]
    fn unit_and_newtype_variants() {
        assert_eq!(from_value::<Shape>(Value::from("Dot")).unwrap(), Shape::Dot);
        let circle = Value::Map(Document::from([("Circle".to_string(), Value::Double(2.0))]));
        assert_eq!(from_value::<Shape>(circle).unwrap(), Shape::Circle(2.0));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        assert!(from_value::<i64>(Value::from("seven")).is_err());
    }
}
