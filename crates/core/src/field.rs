//! Tri-state payload field: absent, explicitly `null`, or present with a value.
//!
//! JSON payloads need to tell "the client did not send this key" apart from
//! "the client sent `null`" and from "the client sent a value". A bare
//! `Option<T>` collapses the first two, and a bare `T` collapses absence into
//! the type's zero value.
//!
//! Use with `#[serde(default)]` on the containing struct field so a missing
//! key deserializes to [`Field::Missing`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// Key not present in the payload.
    #[default]
    Missing,
    /// Key present with a JSON `null`.
    Null,
    /// Key present with a value.
    Value(T),
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
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
        // Only reached when the key is present; absence is handled by `#[serde(default)]`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Value(v),
            None => Self::Null,
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
            Self::Value(v) => serializer.serialize_some(v),
            Self::Missing | Self::Null => serializer.serialize_none(),
        }
    }
}
