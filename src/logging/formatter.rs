//! Canonical JSON record formatter.
//!
//! Every record becomes exactly one JSON object followed by a newline, so
//! line-oriented shippers can parse records independently.
//!
//! ```text
//! {"CorrelationId":"abc-123","level":"info","msg":"Incoming Request","time":1700000000}
//! ```

use std::time::UNIX_EPOCH;

use serde_json::{Map, Value};

use super::record::{level_name, LogRecord};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to marshal fields to JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Formatter producing newline-delimited JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format `record`, appending to `buf` when one is supplied.
    pub fn format(&self, record: &LogRecord, buf: Option<Vec<u8>>) -> Result<Vec<u8>, FormatError> {
        let mut buf = buf.unwrap_or_default();
        self.format_into(record, &mut buf)?;
        Ok(buf)
    }

    /// Append one encoded line to `buf`. On error `buf` is left untouched.
    pub fn format_into(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), FormatError> {
        let data = Self::to_object(record)?;

        let start = buf.len();
        if let Err(e) = serde_json::to_writer(&mut *buf, &data) {
            buf.truncate(start);
            return Err(e.into());
        }
        buf.push(b'\n');
        Ok(())
    }

    fn to_object(record: &LogRecord) -> Result<Map<String, Value>, FormatError> {
        let mut data = Map::new();

        for (key, value) in &record.fields {
            data.insert(key.clone(), value.to_json()?);
        }

        // Fixed keys are inserted last so they always win.
        let secs = record
            .time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_else(|e| -(e.duration().as_secs() as i64));
        data.insert("time".into(), secs.into());
        data.insert("msg".into(), Value::String(record.message.clone()));
        data.insert("level".into(), Value::String(level_name(record.level).into()));

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::{Duration, SystemTime};

    use tracing::Level;

    use super::*;
    use crate::logging::record::FieldValue;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset by peer")]
    struct ResetError;

    fn parse(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("valid json")
    }

    #[test]
    fn writes_fixed_and_extra_fields() {
        let mut record = LogRecord::new(Level::INFO, "hello")
            .with_field("a", 1)
            .with_field("b", "x");
        record.time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let out = JsonFormatter.format(&record, None).unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
        assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 1);

        let v = parse(&out);
        assert_eq!(v["time"], 1_700_000_000);
        assert_eq!(v["msg"], "hello");
        assert_eq!(v["level"], "info");
        assert_eq!(v["a"], 1);
        assert_eq!(v["b"], "x");
    }

    #[test]
    fn error_field_is_stringified() {
        let record = LogRecord::new(Level::ERROR, "upstream failed")
            .with_field("error", FieldValue::error(ResetError));

        let v = parse(&JsonFormatter.format(&record, None).unwrap());
        assert_eq!(v["error"], "connection reset by peer");
    }

    #[test]
    fn fixed_keys_win_over_extra_fields() {
        let record = LogRecord::new(Level::WARN, "real").with_field("msg", "fake");

        let v = parse(&JsonFormatter.format(&record, None).unwrap());
        assert_eq!(v["msg"], "real");
        assert_eq!(v["level"], "warn");
        assert!(v["time"].is_i64());
    }

    #[test]
    fn appends_to_supplied_buffer() {
        let record = LogRecord::new(Level::INFO, "second");
        let buf = b"first\n".to_vec();

        let out = JsonFormatter.format(&record, Some(buf)).unwrap();
        assert!(out.starts_with(b"first\n{"));
        parse(&out[6..]);
    }

    #[test]
    fn unencodable_field_is_reported() {
        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), "tuple keys are not valid JSON object keys");
        let record = LogRecord::new(Level::INFO, "x").with_field("bad", FieldValue::structured(bad));

        let mut buf = b"kept".to_vec();
        let err = JsonFormatter.format_into(&record, &mut buf).unwrap_err();
        assert!(matches!(err, FormatError::Encode(_)));
        assert!(err.to_string().starts_with("failed to marshal fields to JSON"));
        assert_eq!(buf, b"kept");
    }

    #[test]
    fn nan_field_is_reported_not_nulled() {
        let record = LogRecord::new(Level::INFO, "x").with_field("ratio", FieldValue::Float(f64::NAN));

        let mut buf = b"kept".to_vec();
        let err = JsonFormatter.format_into(&record, &mut buf).unwrap_err();
        assert!(matches!(err, FormatError::Encode(_)));
        assert_eq!(buf, b"kept");
    }

    #[test]
    fn nested_infinity_is_reported() {
        let record = LogRecord::new(Level::INFO, "x")
            .with_field("latencies", FieldValue::structured(vec![0.25, f64::INFINITY]));

        assert!(matches!(
            JsonFormatter.format(&record, None),
            Err(FormatError::Encode(_))
        ));
    }

    #[test]
    fn time_is_whole_seconds() {
        let mut record = LogRecord::new(Level::INFO, "t");
        record.time = SystemTime::UNIX_EPOCH + Duration::from_millis(42_999);

        let v = parse(&JsonFormatter.format(&record, None).unwrap());
        assert_eq!(v["time"], 42);
    }
}
