//! Runtime value model
//!
//! Every field a record or view carries holds a `Value`:
//! - Scalars: `Bool`, `Int`, `Float`, `Str`, `DateTime`
//! - Containers: `List`, nested `Record`
//! - `Null` for nullable fields, `Unassigned` for auto-managed fields that
//!   infrastructure has not populated yet

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::schema::Record;

/// Map from field name to value, used for construction inputs, hook
/// payloads and overrides.
pub type ValueMap = BTreeMap<String, Value>;

/// A runtime field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Record(Record),
    /// Sentinel carried by auto-managed fields until infrastructure
    /// assigns them. Serializes as null.
    Unassigned,
}

impl Value {
    /// Human-readable label for error messages. Nested records are
    /// labelled by their schema name.
    pub fn kind(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::DateTime(_) => "datetime".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Record(r) => format!("'{}' record", r.schema().name()),
            Value::Unassigned => "unassigned".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Value::Unassigned)
    }

    /// Render as plain JSON. Nested records drop their private fields;
    /// `Unassigned` renders as null.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Unassigned => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => dt.serialize(serializer),
            Value::List(items) => serializer.collect_seq(items),
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
