//! Serde helpers that store `DateTime<Utc>` fields as native dates.
//!
//! `chrono` serializes dates as strings, which a document store would keep as
//! strings. Tag date fields with these helpers so [`to_value`](super::to_value)
//! produces [`Value::Date`](super::Value::Date) instead:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Person {
//!     #[serde(with = "document_repo::date")]
//!     birth_date: DateTime<Utc>,
//!     #[serde(default, with = "document_repo::date::option")]
//!     created_at: Option<DateTime<Utc>>,
//! }
//! ```
//!
//! Deserialization accepts both an RFC 3339 string and a store timestamp
//! (`{seconds, nanoseconds}`), so records decode whether or not timestamps were
//! converted on read. Formats other than [`to_value`](super::to_value) see a
//! plain RFC 3339 string.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use super::{Timestamp, DATE_TOKEN};

pub(crate) fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_newtype_struct(DATE_TOKEN, &format(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    DateRepr::deserialize(deserializer)?.into_date_time()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateRepr {
    Text(DateTime<Utc>),
    Stored(Timestamp),
}

impl DateRepr {
    fn into_date_time<E: serde::de::Error>(self) -> Result<DateTime<Utc>, E> {
        match self {
            DateRepr::Text(date) => Ok(date),
            DateRepr::Stored(ts) => ts
                .to_date_time()
                .ok_or_else(|| E::custom("timestamp out of range for a date")),
        }
    }
}

/// Same as the parent module for `Option<DateTime<Utc>>`. Pair with
/// `#[serde(default)]` so a missing field decodes as `None`.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<DateRepr>::deserialize(deserializer)?
            .map(DateRepr::into_date_time)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::value::{to_value, Value};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Event {
        #[serde(with = "crate::value::date")]
        at: DateTime<Utc>,
        #[serde(default, with = "crate::value::date::option")]
        ended_at: Option<DateTime<Utc>>,
    }

    fn sample_date() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2022-12-31T23:59:59.5Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn value_serializer_sees_a_date() {
        let event = Event {
            at: sample_date(),
            ended_at: None,
        };
        let value = to_value(&event).unwrap();

        assert_eq!(value.get("at"), Some(&Value::Date(sample_date())));
        assert_eq!(value.get("ended_at"), Some(&Value::Null));
    }

    #[test]
    fn json_sees_a_string() {
        let event = Event {
            at: sample_date(),
            ended_at: Some(sample_date()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["at"], "2022-12-31T23:59:59.500Z");
    }

    #[test]
    fn decodes_from_store_timestamp_shape() {
        let ts = Timestamp::from(sample_date());
        let json = serde_json::json!({
            "at": { "seconds": ts.seconds(), "nanoseconds": ts.nanoseconds() },
        });
        let event: Event = serde_json::from_value(json).unwrap();
        assert_eq!(event.at, sample_date());
        assert_eq!(event.ended_at, None);
    }
}
