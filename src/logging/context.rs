//! Request-scoped logger storage.
//!
//! The execution context of a request is its `http::Extensions` map. The
//! scoped logger is stored under a private newtype, so unrelated code that
//! inserts its own `Logger` (or anything else) into the same map can neither
//! overwrite nor be mistaken for it.

use std::sync::OnceLock;

use axum::http::Extensions;

use super::logger::Logger;

#[derive(Clone)]
struct ScopedLogger(Logger);

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Process-wide fallback logger.
///
/// Initialized on first use to a JSON logger on stdout at the default level,
/// unless [`set_default_logger`] ran first.
pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| Logger::new(Logger::DEFAULT_LEVEL, std::io::stdout))
}

/// Install the process-wide fallback logger. Fails (returning the logger) if
/// one is already in place.
pub fn set_default_logger(logger: Logger) -> Result<(), Logger> {
    DEFAULT_LOGGER.set(logger)
}

/// Return a copy of `extensions` carrying `logger`. The original is untouched.
pub fn with_logger(extensions: &Extensions, logger: Logger) -> Extensions {
    let mut derived = extensions.clone();
    attach_logger(&mut derived, logger);
    derived
}

/// Attach `logger` to a context the caller exclusively owns.
pub fn attach_logger(extensions: &mut Extensions, logger: Logger) {
    extensions.insert(ScopedLogger(logger));
}

/// Logger attached to `extensions`, or the process default.
pub fn current_logger(extensions: &Extensions) -> Logger {
    current_logger_or(extensions, default_logger())
}

/// Logger attached to `extensions`, or `fallback`.
pub fn current_logger_or(extensions: &Extensions, fallback: &Logger) -> Logger {
    extensions
        .get::<ScopedLogger>()
        .map(|scoped| scoped.0.clone())
        .unwrap_or_else(|| fallback.clone())
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    fn sink_logger() -> Logger {
        Logger::new(LevelFilter::INFO, std::io::sink)
    }

    #[test]
    fn attached_logger_is_returned() {
        let mut ctx = Extensions::new();
        ctx.insert(42u32);
        ctx.insert("unrelated".to_string());

        let logger = sink_logger().with_field("CorrelationId", "abc");
        let derived = with_logger(&ctx, logger.clone());

        let found = current_logger(&derived);
        assert!(found.same_core(&logger));
        assert!(found.fields().contains_key("CorrelationId"));
        assert_eq!(derived.get::<u32>(), Some(&42));
    }

    #[test]
    fn original_context_is_not_modified() {
        let ctx = Extensions::new();
        let fallback = sink_logger();
        let _derived = with_logger(&ctx, sink_logger());

        assert!(current_logger_or(&ctx, &fallback).same_core(&fallback));
    }

    #[test]
    fn missing_logger_falls_back_to_default() {
        let ctx = Extensions::new();
        assert!(current_logger(&ctx).same_core(default_logger()));
    }

    #[test]
    fn foreign_logger_value_is_ignored() {
        let mut ctx = Extensions::new();
        ctx.insert(sink_logger());

        assert!(current_logger(&ctx).same_core(default_logger()));
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let parent = Extensions::new();
        let a = with_logger(&parent, sink_logger().with_field("CorrelationId", "a"));
        let b = with_logger(&parent, sink_logger().with_field("CorrelationId", "b"));

        let id = |ext: &Extensions| match current_logger(ext).fields().get("CorrelationId") {
            Some(crate::logging::FieldValue::Str(s)) => s.clone(),
            _ => String::new(),
        };
        assert_eq!(id(&a), "a");
        assert_eq!(id(&b), "b");
    }
}
