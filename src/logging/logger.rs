//! Logger handle and initialization.
//!
//! A [`Logger`] is cheap to clone: the level, formatter and sink live behind
//! an `Arc`, and each handle carries its own immutable set of bound fields.
//! Binding fields never mutates the handle it is called on.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

use super::formatter::JsonFormatter;
use super::record::{FieldValue, Fields, LogRecord};

/// Options accepted by [`init`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct InitOptions {
    /// Minimum severity name. Empty means the default (`info`).
    pub level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log level {level:?}: {source}")]
    LevelParse {
        level: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Build a JSON logger writing to stdout.
pub fn init(options: &InitOptions) -> Result<Logger, LoggerError> {
    init_with_writer(options, std::io::stdout)
}

/// Build a JSON logger writing to the given sink.
pub fn init_with_writer<W>(options: &InitOptions, writer: W) -> Result<Logger, LoggerError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let level = parse_level(&options.level)?;
    Ok(Logger::new(level, writer))
}

fn parse_level(name: &str) -> Result<LevelFilter, LoggerError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Logger::DEFAULT_LEVEL);
    }
    // Names accepted by logrus-style configs.
    match name.to_ascii_lowercase().as_str() {
        "warning" => return Ok(LevelFilter::WARN),
        "fatal" | "panic" => return Ok(LevelFilter::ERROR),
        _ => {}
    }
    LevelFilter::from_str(name).map_err(|e| LoggerError::LevelParse {
        level: name.to_string(),
        source: e.into(),
    })
}

/// Line buffers grown past this are shrunk back after use.
const MAX_RETAINED_BUFFER: usize = 64 * 1024;
const SHRUNK_BUFFER: usize = 4096;

thread_local! {
    static LINE_BUFFER: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

struct LoggerCore {
    level: LevelFilter,
    formatter: JsonFormatter,
    writer: BoxMakeWriter,
}

/// Structured logger bound to a fixed set of fields.
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    fields: Arc<Fields>,
}

impl Logger {
    pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

    pub fn new<W>(level: LevelFilter, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            core: Arc::new(LoggerCore {
                level,
                formatter: JsonFormatter,
                writer: BoxMakeWriter::new(writer),
            }),
            fields: Arc::new(Fields::new()),
        }
    }

    /// Effective minimum severity.
    pub fn level(&self) -> LevelFilter {
        self.core.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.core.level
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Logger {
        self.with_fields([(key.into(), value.into())])
    }

    /// Derive a logger with additional bound fields. Later keys overwrite earlier ones.
    pub fn with_fields<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        let mut merged = (*self.fields).clone();
        merged.extend(fields);
        Logger {
            core: Arc::clone(&self.core),
            fields: Arc::new(merged),
        }
    }

    /// Whether two handles share the same underlying sink and level.
    pub fn same_core(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let record = LogRecord {
            time: std::time::SystemTime::now(),
            level,
            message: message.to_string(),
            fields: (*self.fields).clone(),
        };
        self.emit(&record);
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::TRACE, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }

    fn emit(&self, record: &LogRecord) {
        LINE_BUFFER.with(|cell| match cell.try_borrow_mut() {
            Ok(mut buf) => {
                buf.clear();
                self.write_record(record, &mut buf);
                if buf.capacity() > MAX_RETAINED_BUFFER {
                    buf.clear();
                    buf.shrink_to(SHRUNK_BUFFER);
                }
            }
            // Re-entrant call from inside the sink.
            Err(_) => self.write_record(record, &mut Vec::new()),
        });
    }

    fn write_record(&self, record: &LogRecord, buf: &mut Vec<u8>) {
        if let Err(e) = self.core.formatter.format_into(record, buf) {
            tracing::error!(error = %e, message = %record.message, "Dropping log record");
            return;
        }

        // One write per record keeps lines whole when requests interleave.
        let mut writer = self.core.writer.make_writer();
        if let Err(e) = writer.write_all(buf).and_then(|_| writer.flush()) {
            tracing::warn!(error = %e, "Failed to write log record");
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.core.level)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
