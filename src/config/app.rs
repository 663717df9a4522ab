//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigError, expand_env_vars};
use crate::storage::db::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};

// =============================================================================
// Constants
// =============================================================================

/// Database location used when nothing is configured.
pub const DEFAULT_DATABASE_PATH: &str = "App_Data/waves.db";

fn default_connection_string() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_ACQUIRE_TIMEOUT
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on. IPv6 binds such as `::` need no brackets.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if `bind` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind.trim().parse().map_err(|_| {
            ConfigError::ValidationError(format!("invalid server bind address: '{}'", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Where the database lives: a `sqlite:` URL, a `Data Source=<path>`
    /// connection string, or a bare file path.
    #[serde(default = "default_connection_string")]
    pub connection_string: String,

    /// Maximum pooled connections (default: 5).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an operation waits for a free connection (default: "30s").
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: default_connection_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the configured location to a sqlx SQLite URL.
    ///
    /// - `sqlite:...` URLs are used verbatim
    /// - `Data Source=<path>` takes the path, ignoring other `key=value` pairs
    /// - anything else is a file path
    ///
    /// File paths become `sqlite:<path>?mode=rwc`; an empty value falls back
    /// to [`DEFAULT_DATABASE_PATH`].
    pub fn connection_url(&self) -> String {
        let raw = self.connection_string.trim();
        if raw.starts_with("sqlite:") {
            return raw.to_string();
        }

        let path = data_source(raw).unwrap_or(raw);
        let path = if path.is_empty() {
            DEFAULT_DATABASE_PATH
        } else {
            path
        };

        format!("sqlite:{path}?mode=rwc")
    }
}

/// Extract the `Data Source` value from an ADO-style connection string.
fn data_source(conn: &str) -> Option<&str> {
    conn.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        (key.eq_ignore_ascii_case("data source") || key.eq_ignore_ascii_case("datasource"))
            .then(|| value.trim())
    })
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "Config file '{}' not found, using defaults",
                path.display()
            );
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database max_connections must be positive".to_string(),
            ));
        }

        if self.database.acquire_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "database acquire_timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
