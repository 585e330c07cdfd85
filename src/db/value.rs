//! Bind values produced by insert extractors.
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::Any;

/// One value bound to a `?` placeholder.
///
/// Extractors return a `Vec<Value>` per item so that rows of mixed column
/// types can share one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Point in time, bound as RFC 3339 text.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Bind this value as the next argument of `query`.
    pub(crate) fn bind<'q>(
        &'q self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Query<'q, Any, AnyArguments<'q>> {
        match *self {
            Self::Null => query.bind(None::<i64>),
            Self::Bool(value) => query.bind(value),
            Self::Int(value) => query.bind(value),
            Self::Float(value) => query.bind(value),
            Self::Text(ref value) => query.bind(value.as_str()),
            Self::Blob(ref value) => query.bind(value.as_slice()),
            Self::Timestamp(ref value) => query.bind(rfc3339(value)),
        }
    }
}

/// Timestamps are stored and rendered with second precision in UTC.
fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(ref value) => write!(f, "{value}"),
            Self::Blob(ref value) => write!(f, "{}", String::from_utf8_lossy(value)),
            Self::Timestamp(ref value) => write!(f, "{}", rfc3339(value)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// JSON arrays and objects have no column type; they are bound as their JSON text.
impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match *value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(ref number) => number.as_i64().map_or_else(
                || number.as_f64().map_or_else(|| Self::Text(number.to_string()), Self::Float),
                Self::Int,
            ),
            serde_json::Value::String(ref value) => Self::Text(value.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Self::Text(value.to_string())
            }
        }
    }
}
