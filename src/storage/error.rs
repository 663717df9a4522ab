//! Storage-specific error types.
//!
//! All repository operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (database, constraint, data, etc.).
//! A missing row on a read is not an error; reads return `Option` instead.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row with this id already exists.
    #[error("wave with ID {0} already exists")]
    Conflict(Uuid),

    /// No row with this id exists.
    #[error("wave with ID {0} not found")]
    NotFound(Uuid),

    /// The statement was refused before reaching the database.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid data in database (e.g., unparseable id or date).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error (e.g., filesystem setup failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Map a sqlx error raised by an insert, turning unique-key violations
    /// into [`StorageError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error, id: Uuid) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::Conflict(id),
            _ => Self::Database(err),
        }
    }
}
