//! Configuration module for the waves service.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Database settings (connection string, pool size, acquire timeout)

mod app;
mod validation;

pub use app::{AppConfig, DEFAULT_DATABASE_PATH, DatabaseConfig, ServerConfig};
pub use validation::{ConfigError, expand_env_vars};
