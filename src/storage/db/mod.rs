//! Database abstraction layer.
//!
//! The wave store runs on SQLite through sqlx. The abstraction is kept
//! minimal: `SqlitePool` owns the pool and its connection settings, the
//! repository acquires connections from it per operation.
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::connect("sqlite:App_Data/waves.db?mode=rwc").await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS, SqlitePool};
