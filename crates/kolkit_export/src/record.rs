//! Read-only field access over caller-owned records.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One raw field value as exposed by a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFieldValue<'a> {
    /// Field is absent or null.
    Missing,
    Text(Cow<'a, str>),
    Integer(i64),
    Number(f64),
    Flag(bool),
    Timestamp(DateTime<Utc>),
}

impl EnumFieldValue<'_> {
    /// Short shape name used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Flag(_) => "flag",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Whether the field is absent or null.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// A record whose fields can be looked up by key.
///
/// Implementations must not mutate the record; mapping is read-only.
pub trait Record {
    fn field(&self, key: &str) -> EnumFieldValue<'_>;
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, key: &str) -> EnumFieldValue<'_> {
        (**self).field(key)
    }
}

impl Record for Map<String, Value> {
    fn field(&self, key: &str) -> EnumFieldValue<'_> {
        self.get(key)
            .map_or(EnumFieldValue::Missing, derive_field_value_from_json)
    }
}

impl Record for Value {
    fn field(&self, key: &str) -> EnumFieldValue<'_> {
        match self {
            Value::Object(map) => map.field(key),
            _ => EnumFieldValue::Missing,
        }
    }
}

fn derive_field_value_from_json(value: &Value) -> EnumFieldValue<'_> {
    match value {
        Value::Null => EnumFieldValue::Missing,
        Value::Bool(b) => EnumFieldValue::Flag(*b),
        Value::String(s) => EnumFieldValue::Text(Cow::Borrowed(s.as_str())),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                EnumFieldValue::Integer(v)
            } else {
                n.as_f64()
                    .map_or(EnumFieldValue::Missing, EnumFieldValue::Number)
            }
        }
        // Nested values are passed through as their JSON text.
        Value::Array(_) | Value::Object(_) => EnumFieldValue::Text(Cow::Owned(value.to_string())),
    }
}
