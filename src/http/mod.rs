//! HTTP request logging subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → correlation.rs (X-Request-Id or fresh UUID)
//!     → middleware.rs (scoped logger, "Incoming Request")
//!     → extract.rs (handlers pull the scoped logger)
//!     → inner service
//!     → observer.rs (status, bytes written)
//!     → middleware.rs ("Completed Request" with responseTime)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Logging never changes the response: no headers added, body untouched
//! - One scoped logger per request, never shared across requests
//! - X-Forwarded-For is trusted for the client IP

pub mod correlation;
pub mod extract;
pub mod info;
pub mod middleware;
pub mod observer;
pub mod server;

pub use correlation::{CorrelationIdSource, RandomUuid, CORRELATION_ID_FIELD, X_REQUEST_ID};
pub use extract::RequestLogger;
pub use middleware::{RequestLogging, RequestLoggingLayer};
pub use observer::{ObservedBody, ResponseOutcome};
pub use server::HttpServer;
