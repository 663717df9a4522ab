//! Waves - CRUD API for dated, named records
//!
//! This crate provides the core of the waves service. It can be used as a
//! library by other Rust projects, or run as a standalone binary with the
//! `waves` executable.
//!
//! # Architecture
//!
//! - **Storage**: SQLite persistence through a sqlx pool ([`storage`])
//! - **Service**: request validation and orchestration ([`service`])
//! - **Server**: axum JSON API and health probes ([`server`])
//! - **Config**: YAML configuration with env/CLI overrides ([`config`])
//!
//! # Example
//!
//! ```rust,ignore
//! use waves::{StorageBuilder, WaveService};
//! use waves::server::{AppState, create_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = StorageBuilder::new("sqlite:App_Data/waves.db?mode=rwc")
//!         .build()
//!         .await?;
//!     let app = create_router(AppState {
//!         wave_service: WaveService::new(handles.wave_store.clone()),
//!         pool: handles.pool.clone(),
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod server;
pub mod service;
pub mod storage;

pub use service::{ServiceError, WaveService};
pub use storage::{
    StorageBuilder, StorageError, StorageHandles, Wave, WaveRepository, WaveStore,
};
