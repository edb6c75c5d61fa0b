//! Dynamic values produced by coercion.
//!
//! A [`Value`] is the typed result of coercing one raw environment string
//! (or an override) against a [`FieldType`](crate::FieldType). A [`Record`]
//! is a constructed schema instance; it is what struct transforms mutate and
//! what gets handed to serde to build the final settings type.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

/// A numeric bound used by `gt`/`ge`/`lt`/`le` constraints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integer bound.
    Int(i64),
    /// Floating point bound.
    Float(f64),
}

impl Number {
    /// The bound as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    /// Compares two numbers, exactly for two integers.
    #[must_use]
    pub fn partial_cmp_number(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A member of an enumeration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Name of the enumeration type.
    pub enum_name: String,
    /// Member name.
    pub member: String,
    /// Member value, used when serializing.
    pub value: String,
}

/// A dynamically typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value (`None`).
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Offset-aware timestamp.
    DateTime(DateTime<FixedOffset>),
    /// Timestamp without offset.
    NaiveDateTime(NaiveDateTime),
    /// Signed duration.
    Duration(Duration),
    /// Enumeration member.
    Enum(EnumValue),
    /// Ordered sequence (lists and tuples).
    List(Vec<Value>),
    /// Sequence of distinct values.
    Set(Vec<Value>),
    /// String-keyed mapping.
    Map(BTreeMap<String, Value>),
    /// Constructed schema instance.
    Record(Record),
}

impl Value {
    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) | Self::NaiveDateTime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float content; integers widen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Nested record, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Mutable nested record, if this is a record.
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Numeric view used by bound constraints. Booleans count as 0/1.
    #[must_use]
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Self::Int(value) => Some(Number::Int(*value)),
            Self::Float(value) => Some(Number::Float(*value)),
            Self::Bool(value) => Some(Number::Int(i64::from(*value))),
            _ => None,
        }
    }

    /// Length used by `min_length`/`max_length`: characters for strings,
    /// entries for containers.
    #[must_use]
    pub(crate) fn length(&self) -> Option<usize> {
        match self {
            Self::Str(value) => Some(value.chars().count()),
            Self::List(items) | Self::Set(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// JSON projection handed to serde when building typed settings.
    ///
    /// Temporal values become ISO-8601 strings, durations become
    /// `{"secs", "nanos"}` objects and enum members become their value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(value) => json!(value),
            Self::Int(value) => json!(value),
            Self::Float(value) => json!(value),
            Self::Str(value) => json!(value),
            Self::Date(value) => json!(value.format("%Y-%m-%d").to_string()),
            Self::Time(value) => json!(value.format("%H:%M:%S%.f").to_string()),
            Self::DateTime(value) => json!(value.to_rfc3339()),
            Self::NaiveDateTime(value) => json!(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::Duration(value) => {
                let secs = value.num_seconds();
                let nanos = (*value - Duration::seconds(secs))
                    .num_nanoseconds()
                    .unwrap_or(0);
                json!({ "secs": secs, "nanos": nanos })
            }
            Self::Enum(member) => json!(member.value),
            Self::List(items) | Self::Set(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Self::Record(record) => record.to_json(),
        }
    }

    /// Builds an untyped value from JSON. Objects become maps.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(*value),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(value) => Self::Str(value.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A constructed schema instance: the schema name plus its field values in
/// declaration order.
///
/// # Examples
///
/// ```
/// use strictenv::{Record, Value};
///
/// let mut record = Record::new("Database");
/// record.insert("host", Value::from("localhost"));
/// record.insert("port", Value::from(5432));
///
/// record.set("port", Value::from(5433)).unwrap();
/// assert_eq!(record.get("port"), Some(&Value::Int(5433)));
/// assert!(record.set("missing", Value::Null).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record for the named schema.
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            fields: Vec::new(),
        }
    }

    /// Name of the schema this record is an instance of.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Mutable value of a field.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Replaces the value of an existing field, returning the old value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the record has no such field.
    pub fn set(&mut self, field: &str, value: Value) -> Result<Value> {
        let schema = self.schema.clone();
        let slot = self.get_mut(field).ok_or_else(|| {
            Error::config(format!("record {schema} has no field '{field}'"))
        })?;
        Ok(std::mem::replace(slot, value))
    }

    /// Appends or replaces a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.get_mut(&field) {
            Some(slot) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Iterates over fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// JSON object projection of the record.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Builds a typed value from the record's JSON projection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] scoped to `field_path` if serde rejects the
    /// projection.
    pub fn deserialize<T: DeserializeOwned>(&self, field_path: &str) -> Result<T> {
        let json = self.to_json();
        serde_json::from_value(json.clone()).map_err(|err| Error::Parse {
            field: field_path.to_string(),
            target_type: self.schema.clone(),
            raw_value: json.to_string(),
            source: Some(Box::new(err)),
        })
    }
}
