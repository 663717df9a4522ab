//! Storage Layer
//!
//! SQLite persistence for waves through a sqlx connection pool.
//!
//! # Components
//!
//! - [`WaveRepository`]: data access contract used by the service layer
//! - [`WaveStore`]: SQLite implementation issuing parameterized statements
//! - [`StorageBuilder`] / [`StorageHandles`]: initialization and lifecycle management

mod builder;
pub mod db;
mod error;
mod schema;
mod types;
pub mod wave_store;

pub use builder::{StorageBuilder, StorageHandles};
pub use db::SqlitePool;
pub use error::StorageError;
pub use schema::{WAVES_TABLE_DDL, init_schema};
pub use types::{
    WAVE_DATE_FORMAT, Wave, format_wave_date, parse_wave_date, truncate_to_seconds,
};
pub use wave_store::{WaveRepository, WaveStore};
