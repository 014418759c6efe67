//! Host values.
//!
//! `Val` is what flows into a constructor and what a sealed record holds:
//! plain JSON shapes plus the two things JSON cannot carry on its own, dates
//! and record instances.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::record::Record;

#[derive(Debug, Clone)]
pub enum Val {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Val>),
    Object(IndexMap<String, Val>),
    Record(Record),
}

impl Val {
    /// Build a plain object from key/value pairs, keeping their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Val>,
        I: IntoIterator<Item = (K, V)>,
    {
        Val::Object(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Val>,
        I: IntoIterator<Item = V>,
    {
        Val::Array(items.into_iter().map(Into::into).collect())
    }

    /// Diagnostic name of the value's runtime kind, as shown in failure reports.
    pub fn kind(&self) -> String {
        match self {
            Val::Null => "null".to_string(),
            Val::Bool(_) => "boolean".to_string(),
            Val::Number(_) => "number".to_string(),
            Val::String(_) => "string".to_string(),
            Val::Date(_) => "Date".to_string(),
            Val::Array(_) => "Array".to_string(),
            Val::Object(_) => "object".to_string(),
            Val::Record(record) => record.record_type().name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Val::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Val::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Val]> {
        match self {
            Val::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Val>> {
        match self {
            Val::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Val::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Property lookup on plain objects and records alike.
    pub fn get(&self, key: &str) -> Option<&Val> {
        match self {
            Val::Object(map) => map.get(key),
            Val::Record(record) => record.get(key),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<Value> for Val {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Val::Null,
            Value::Bool(b) => Val::Bool(b),
            Value::Number(n) => Val::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Val::String(s),
            Value::Array(xs) => Val::Array(xs.into_iter().map(Val::from).collect()),
            Value::Object(m) => Val::Object(from_json_map(m)),
        }
    }
}

fn from_json_map(map: Map<String, Value>) -> IndexMap<String, Val> {
    map.into_iter().map(|(k, v)| (k, Val::from(v))).collect()
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::String(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::String(s)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Number(n)
    }
}

impl From<i32> for Val {
    fn from(n: i32) -> Self {
        Val::Number(n as f64)
    }
}

impl From<i64> for Val {
    fn from(n: i64) -> Self {
        Val::Number(n as f64)
    }
}

impl From<DateTime<Utc>> for Val {
    fn from(d: DateTime<Utc>) -> Self {
        Val::Date(d)
    }
}

impl From<Record> for Val {
    fn from(record: Record) -> Self {
        Val::Record(record)
    }
}

impl From<&Record> for Val {
    fn from(record: &Record) -> Self {
        Val::Record(record.clone())
    }
}

impl From<Vec<Val>> for Val {
    fn from(xs: Vec<Val>) -> Self {
        Val::Array(xs)
    }
}

impl From<IndexMap<String, Val>> for Val {
    fn from(map: IndexMap<String, Val>) -> Self {
        Val::Object(map)
    }
}

impl<T: Into<Val>> From<Option<T>> for Val {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Val::Null)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
