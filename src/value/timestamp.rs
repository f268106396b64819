use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::TIMESTAMP_TOKEN;

/// Store-native point in time: whole seconds since the Unix epoch plus
/// nanoseconds, the way document databases keep it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Nanoseconds are clamped below one second.
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds: nanoseconds.min(999_999_999),
        }
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// `None` when the timestamp is outside the range chrono can represent.
    pub fn to_date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds)
    }

    /// The smallest timestamp strictly after this one.
    pub fn next(&self) -> Self {
        if self.nanoseconds == 999_999_999 {
            Self::new(self.seconds + 1, 0)
        } else {
            Self::new(self.seconds, self.nanoseconds + 1)
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value.timestamp(), value.timestamp_subsec_nanos())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct(TIMESTAMP_TOKEN, 2)?;
        out.serialize_field("seconds", &self.seconds)?;
        out.serialize_field("nanoseconds", &self.nanoseconds)?;
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_and_from_date_time() {
        let date = DateTime::parse_from_rfc3339("2023-07-04T12:30:15.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let ts = Timestamp::from(date);

        assert_eq!(ts.seconds(), date.timestamp());
        assert_eq!(ts.nanoseconds(), 250_000_000);
        assert_eq!(ts.to_date_time(), Some(date));
    }

    #[test]
    fn next_rolls_over_seconds() {
        assert_eq!(Timestamp::new(5, 999_999_999).next(), Timestamp::new(6, 0));
        assert_eq!(Timestamp::new(5, 1).next(), Timestamp::new(5, 2));
        assert!(Timestamp::new(5, 1) < Timestamp::new(5, 1).next());
    }

    #[test]
    fn plain_serializers_see_seconds_and_nanoseconds() {
        let json = serde_json::to_value(Timestamp::new(10, 20)).unwrap();
        assert_eq!(json, serde_json::json!({ "seconds": 10, "nanoseconds": 20 }));
    }
}
