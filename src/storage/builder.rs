//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing the wave store.

use std::path::Path;
use std::time::Duration;

use crate::storage::StorageError;
use crate::storage::WaveStore;
use crate::storage::db::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS, SqlitePool};
use crate::storage::schema::init_schema;

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl StorageBuilder {
    /// Create a new storage builder.
    ///
    /// `url` is a sqlx SQLite URL such as `sqlite:App_Data/waves.db?mode=rwc`
    /// or `sqlite::memory:`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set how long an operation waits for a free connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Build the storage layer and return handles.
    ///
    /// Creates the database directory and the waves table when missing.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        if let Some(path) = database_file(&self.url)
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Internal(format!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let pool =
            SqlitePool::connect_with(&self.url, self.max_connections, self.acquire_timeout).await?;
        init_schema(&pool).await?;

        Ok(StorageHandles {
            wave_store: WaveStore::new(pool.clone()),
            pool,
        })
    }
}

/// File path portion of a SQLite URL, or `None` for in-memory databases.
fn database_file(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(path)
    }
}

/// Handles to the storage layer.
#[derive(Clone, Debug)]
pub struct StorageHandles {
    /// Wave repository.
    pub wave_store: WaveStore,
    /// Underlying pool, used for readiness checks and shutdown.
    pub pool: SqlitePool,
}

impl StorageHandles {
    /// Gracefully shutdown the storage layer, closing every pooled connection.
    pub async fn shutdown(self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
