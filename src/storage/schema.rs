//! Database schema definitions.

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;

/// SQL statement for creating the waves table.
///
/// Every column is TEXT: ids are hyphenated UUIDs, dates use the
/// `YYYY-MM-DD HH:MM:SS` layout. `name` is nullable at the column level;
/// the repository refuses empty names before they reach it.
pub const WAVES_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS waves (
    id       TEXT PRIMARY KEY,
    name     TEXT,
    wavedate TEXT
);
"#;

/// Initialize the database schema.
///
/// Creates the waves table if it doesn't exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(WAVES_TABLE_DDL).execute(pool.inner()).await?;

    tracing::info!("Database schema initialized");
    Ok(())
}
