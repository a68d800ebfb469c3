//! Log record model.
//!
//! Field values are a closed set of variants. Failures carry their display
//! string capability with them, so the formatter can always stringify them
//! instead of trying to serialize error internals.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;
use tracing::Level;

use super::finite::check_finite;

/// Extra fields attached to a record or bound to a logger.
pub type Fields = BTreeMap<String, FieldValue>;

/// A structured value that is encoded lazily, at format time.
pub trait StructuredValue: fmt::Debug + Send + Sync {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T> StructuredValue for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        check_finite(self)?;
        serde_json::to_value(self)
    }
}

/// Value of a single log field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Structured(Arc<dyn StructuredValue>),
    Failure(Arc<dyn std::error::Error + Send + Sync>),
}

impl FieldValue {
    /// Wrap any serializable value (nested objects, arrays, ...).
    pub fn structured<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        FieldValue::Structured(Arc::new(value))
    }

    /// Wrap an error; it is written as its display string.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldValue::Failure(Arc::new(err))
    }

    pub(crate) fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(match self {
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => (*i).into(),
            FieldValue::UInt(u) => (*u).into(),
            FieldValue::Float(f) => {
                check_finite(f)?;
                serde_json::to_value(f)?
            }
            FieldValue::Str(s) => serde_json::Value::String(s.clone()),
            FieldValue::Structured(v) => v.to_json()?,
            FieldValue::Failure(e) => serde_json::Value::String(e.to_string()),
        })
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::UInt(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// One log event, ready to be formatted.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: SystemTime,
    pub level: Level,
    pub message: String,
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: SystemTime::now(),
            level,
            message: message.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Canonical lowercase name of a severity.
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        _ => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn failure_becomes_display_string() {
        let v = FieldValue::error(DiskFull);
        assert_eq!(v.to_json().unwrap(), serde_json::json!("disk full"));
    }

    #[test]
    fn structured_value_is_encoded() {
        let v = FieldValue::structured(vec![1, 2, 3]);
        assert_eq!(v.to_json().unwrap(), serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn non_finite_float_is_an_error() {
        assert!(FieldValue::Float(f64::NAN).to_json().is_err());
        assert!(FieldValue::structured(vec![1.0, f64::INFINITY]).to_json().is_err());
        assert_eq!(FieldValue::Float(2.5).to_json().unwrap(), serde_json::json!(2.5));
    }

    #[test]
    fn level_names_are_lowercase() {
        assert_eq!(level_name(Level::WARN), "warn");
        assert_eq!(level_name(Level::INFO), "info");
    }
}
