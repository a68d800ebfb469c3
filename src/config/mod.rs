//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → ServiceConfig (immutable)
//!     → CLI overrides applied in main
//!     → logging::init(&config.logging)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Level names are validated by `logging::init`, not here

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ServiceConfig};
