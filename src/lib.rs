//! Request-scoped structured logging for HTTP services.

pub mod config;
pub mod http;
pub mod logging;

pub use config::ServiceConfig;
pub use http::{HttpServer, RequestLogger, RequestLoggingLayer};
pub use logging::{init, InitOptions, Logger};
