//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (request logging, request timeout)
//! - Serve with connect info so client addresses reach the logs
//! - Shut down gracefully

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServiceConfig;
use crate::http::extract::RequestLogger;
use crate::http::middleware::RequestLoggingLayer;
use crate::logging::Logger;

/// Demo HTTP server with request logging in front of every route.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, logger: Logger) -> Self {
        Self {
            router: Self::build_router(&config, logger),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, logger: Logger) -> Router {
        Router::new()
            .route("/", get(hello_handler))
            .route("/echo", post(echo_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestLoggingLayer::new(logger))
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn hello_handler(log: RequestLogger) -> &'static str {
    log.debug("Saying hello");
    "hello\n"
}

async fn echo_handler(log: RequestLogger, body: Bytes) -> Bytes {
    log.with_field("bodyLength", body.len() as u64).debug("Echoing body");
    body
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
