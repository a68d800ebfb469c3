//! Structured logging subsystem.
//!
//! # Data Flow
//! ```text
//! init(InitOptions)
//!     → logger.rs (level, sink, JSON formatter)
//!     → Logger (shared core, bound fields)
//!
//! Per request:
//!     middleware binds CorrelationId
//!     → context.rs (attach to request extensions)
//!     → handlers fetch it back (or the process default)
//!     → record.rs (LogRecord with typed field values)
//!     → formatter.rs (one JSON object per line)
//!     → sink
//! ```
//!
//! # Design Decisions
//! - Field values are a closed enum; errors are written as their display string
//! - The default logger is an explicit, once-initialized fallback
//! - Encoding failures drop the record, never the request

pub mod context;
mod finite;
pub mod formatter;
pub mod logger;
pub mod record;

pub use context::{
    attach_logger, current_logger, current_logger_or, default_logger, set_default_logger,
    with_logger,
};
pub use formatter::{FormatError, JsonFormatter};
pub use logger::{init, init_with_writer, InitOptions, Logger, LoggerError};
pub use record::{FieldValue, Fields, LogRecord, StructuredValue};
