//! Core Gateway Traits
//!
//! The ORM talks to the relational store through a single contract: run a
//! parameterized statement and hand back rows. Pooling, connectivity and
//! transport belong to the implementor.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::OrmResult;

/// One result row: column name to JSON value, in column order
pub type Row = serde_json::Map<String, JsonValue>;

/// Outcome of a statement that does not return rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    pub rows_affected: u64,
    /// Identifier generated by an INSERT, when the store produced one
    pub last_insert_id: Option<u64>,
}

/// Parameterized "execute SQL, return rows" primitive
///
/// Placeholders are positional `?`, bound left to right. A
/// [`DatabaseValue::Array`] bound to a single placeholder expands into one
/// placeholder per element (see [`expand_array_placeholders`]).
///
/// Implementations must be safe to call concurrently from unrelated tasks.
#[async_trait]
pub trait ConnectionGateway: Send + Sync {
    /// Execute a query and return the result rows
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>>;

    /// Execute a statement and return the affected row count and insert id
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult>;
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Json(JsonValue),
    Array(Vec<DatabaseValue>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::from(*i),
            DatabaseValue::Int64(i) => JsonValue::from(*i),
            DatabaseValue::UInt64(i) => JsonValue::from(*i),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Json(j) => j.clone(),
            DatabaseValue::Array(arr) => JsonValue::Array(arr.iter().map(|v| v.to_json()).collect()),
        }
    }

    /// Create DatabaseValue from JSON value
    ///
    /// Strings stay strings; no UUID or timestamp sniffing happens here so a
    /// key read from one row binds exactly as it was returned.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        DatabaseValue::Int32(i as i32)
                    } else {
                        DatabaseValue::Int64(i)
                    }
                } else if let Some(u) = n.as_u64() {
                    DatabaseValue::UInt64(u)
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            JsonValue::Array(arr) => {
                DatabaseValue::Array(arr.into_iter().map(DatabaseValue::from_json).collect())
            }
            JsonValue::Object(_) => DatabaseValue::Json(json),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<u32> for DatabaseValue {
    fn from(value: u32) -> Self {
        DatabaseValue::Int64(value as i64)
    }
}

impl From<u64> for DatabaseValue {
    fn from(value: u64) -> Self {
        DatabaseValue::UInt64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&String> for DatabaseValue {
    fn from(value: &String) -> Self {
        DatabaseValue::String(value.clone())
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<chrono::NaiveDate> for DatabaseValue {
    fn from(value: chrono::NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::from_json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// Expand every `?` bound to a [`DatabaseValue::Array`] into `?, ?, ...`
///
/// Placeholders inside quoted literals are left alone; a backslash inside a
/// string literal escapes the next character. An empty array
/// renders `NULL` so `col IN (?)` stays valid and matches nothing.
pub fn expand_array_placeholders(sql: &str, params: &[DatabaseValue]) -> (String, Vec<DatabaseValue>) {
    if !params.iter().any(|p| matches!(p, DatabaseValue::Array(_))) {
        return (sql.to_string(), params.to_vec());
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 3);
    let mut flat = Vec::with_capacity(params.len());
    let mut remaining = params.iter();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in sql.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match (ch, quote) {
            ('\\', Some('\'' | '"')) => {
                escaped = true;
                out.push(ch);
            }
            ('\'' | '"' | '`', None) => {
                quote = Some(ch);
                out.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                out.push(ch);
            }
            ('?', None) => match remaining.next() {
                Some(DatabaseValue::Array(items)) if items.is_empty() => out.push_str("NULL"),
                Some(DatabaseValue::Array(items)) => {
                    out.push_str(&vec!["?"; items.len()].join(", "));
                    flat.extend(items.iter().cloned());
                }
                Some(value) => {
                    out.push('?');
                    flat.push(value.clone());
                }
                None => out.push('?'),
            },
            _ => out.push(ch),
        }
    }

    flat.extend(remaining.cloned());
    (out, flat)
}
