//! Presence marker for partial-update payloads
//!
//! Update requests need to distinguish a field that was left out of the
//! JSON body from a field that was explicitly set to `null`. An
//! `Option<T>` collapses the two, so update payloads wrap nullable
//! fields in [`Field<T>`] instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state value for a single field of an update payload.
///
/// Use with `#[serde(default, skip_serializing_if = "Field::is_absent")]`
/// so that a missing key deserializes to `Absent` and an absent field is
/// not serialized at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// The key was not present in the payload; leave the column alone.
    #[default]
    Absent,
    /// The key was present with an explicit `null`; clear the column.
    Null,
    /// The key was present with a value; set the column.
    Set(T),
}

impl<T> Field<T> {
    /// True when the field was not present in the payload
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Convert to a nested option: `None` for absent, `Some(None)` for
    /// explicit null, `Some(Some(value))` for a set value.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Field::Absent => None,
            Field::Null => Some(None),
            Field::Set(v) => Some(Some(v)),
        }
    }

    /// Borrowing variant of [`Field::into_option`]
    pub fn as_option(&self) -> Option<Option<&T>> {
        match self {
            Field::Absent => None,
            Field::Null => Some(None),
            Field::Set(v) => Some(Some(v)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present key is either null or a value; a missing key never
        // reaches this impl and is handled by #[serde(default)].
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Field::Set(v),
            None => Field::Null,
        })
    }
}

impl<T> Serialize for Field<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Set(v) => v.serialize(serializer),
            // Absent is expected to be skipped by the struct attribute;
            // if it is serialized anyway it degrades to null.
            Field::Null | Field::Absent => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        #[serde(default, skip_serializing_if = "Field::is_absent")]
        note: Field<String>,
    }

    #[test]
    fn missing_key_deserializes_to_absent() {
        let p: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.note, Field::Absent);
    }

    #[test]
    fn explicit_null_deserializes_to_null() {
        let p: Payload = serde_json::from_str(r#"{"note":null}"#).unwrap();
        assert_eq!(p.note, Field::Null);
    }

    #[test]
    fn value_deserializes_to_set() {
        let p: Payload = serde_json::from_str(r#"{"note":"hello"}"#).unwrap();
        assert_eq!(p.note, Field::Set("hello".to_string()));
    }

    #[test]
    fn absent_field_is_skipped_on_serialize() {
        let p = Payload {
            note: Field::Absent,
        };
        assert_eq!(serde_json::to_string(&p).unwrap(), "{}");

        let p = Payload { note: Field::Null };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"note":null}"#);

        let p = Payload {
            note: Field::Set("x".to_string()),
        };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"note":"x"}"#);
    }

    #[test]
    fn into_option_maps_all_states() {
        assert_eq!(Field::<i32>::Absent.into_option(), None);
        assert_eq!(Field::<i32>::Null.into_option(), Some(None));
        assert_eq!(Field::Set(7).into_option(), Some(Some(7)));
    }
}
