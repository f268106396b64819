use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ABSENT_TOKEN;

/// A payload field that is either left alone, explicitly cleared, or set.
///
/// Use it for partial updates where "do not touch" and "set to null" must stay
/// distinct:
///
/// ```ignore
/// #[derive(Serialize, Default)]
/// struct UserPatch {
///     nickname: Field<String>,   // Absent unless assigned
///     phone: Field<String>,
/// }
///
/// let patch = UserPatch { nickname: Field::Null, ..Default::default() };
/// // stored write: { "nickname": null }
/// ```
///
/// Pair with `#[serde(default)]` when deserializing so missing keys decode as
/// [`Field::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(value),
        }
    }

    /// The set value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(f(value)),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<T> From<Option<T>> for Field<T> {
    /// `None` is an explicit clear, not an omission.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Value(value),
            None => Field::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Absent => serializer.serialize_unit_struct(ABSENT_TOKEN),
            Field::Null => serializer.serialize_none(),
            Field::Value(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{to_value, Value};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default)]
        name: Field<String>,
        #[serde(default)]
        age: Field<u32>,
        #[serde(default)]
        email: Field<String>,
    }

    #[test]
    fn three_states_serialize_distinctly() {
        let patch = Patch {
            name: Field::Value("Ana".into()),
            age: Field::Null,
            email: Field::Absent,
        };
        let value = to_value(&patch).unwrap();

        assert_eq!(value.get("name"), Some(&Value::from("Ana")));
        assert_eq!(value.get("age"), Some(&Value::Null));
        assert_eq!(value.get("email"), Some(&Value::Absent));
    }

    #[test]
    fn missing_keys_decode_as_absent() {
        let patch: Patch = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "age": null,
        }))
        .unwrap();

        assert_eq!(patch.name, Field::Value("Ana".to_string()));
        assert_eq!(patch.age, Field::Null);
        assert_eq!(patch.email, Field::Absent);
    }

    #[test]
    fn option_none_means_clear() {
        assert_eq!(Field::<u8>::from(None), Field::Null);
        assert_eq!(Field::from(Some(3)), Field::Value(3));
    }
}
