//! Wave use-case service.
//!
//! Validates request shape before delegating to a [`WaveRepository`]:
//! - names must not be empty or whitespace
//! - an update's route id must match the body id
//! - creates require an unused id, updates an existing one
//!
//! The service never touches SQL; any repository implementation can back it.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::storage::{StorageError, Wave, WaveRepository};

/// Errors reported by the wave service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request is malformed (blank name, id mismatch, unreadable body).
    #[error("{0}")]
    InvalidArgument(String),

    /// A wave with this id already exists.
    #[error("Wave with ID {0} already exists")]
    Conflict(Uuid),

    /// No wave with this id exists.
    #[error("Wave with ID {0} not found")]
    NotFound(Uuid),

    /// Storage failed.
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(id) => Self::Conflict(id),
            StorageError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Message used when the route id and body id differ.
pub const ID_MISMATCH_MESSAGE: &str = "ID in route must match ID in body";

/// Message used when a name is empty or whitespace.
pub const BLANK_NAME_MESSAGE: &str = "Name cannot be empty or composed entirely of whitespace";

/// Use-case service for wave CRUD operations.
pub struct WaveService<R: WaveRepository> {
    repo: Arc<R>,
}

impl<R: WaveRepository> Clone for WaveService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: WaveRepository> WaveService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }

    /// Lists every wave.
    pub async fn list_all(&self) -> Result<Vec<Wave>, ServiceError> {
        Ok(self.repo.list_all().await?)
    }

    /// Gets one wave by id; `None` when absent.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Wave>, ServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Creates a wave.
    ///
    /// # Contract
    /// - Blank name -> `InvalidArgument`
    /// - Id already stored -> `Conflict`, repository create is not called
    pub async fn create(&self, wave: Wave) -> Result<Wave, ServiceError> {
        ensure_named(&wave)?;

        if self.repo.exists(wave.id).await? {
            tracing::debug!(id = %wave.id, "Rejected create of existing wave");
            return Err(ServiceError::Conflict(wave.id));
        }

        let created = self.repo.create(&wave).await?;
        tracing::info!(id = %created.id, name = %created.name, "Created wave");
        Ok(created)
    }

    /// Updates name and date of an existing wave.
    ///
    /// # Contract
    /// Checks run in a fixed order so the reported error is deterministic:
    /// 1. blank name -> `InvalidArgument`
    /// 2. `route_id != wave.id` -> `InvalidArgument`, before any storage access
    /// 3. id not stored -> `NotFound`
    pub async fn update(&self, route_id: Uuid, wave: Wave) -> Result<Wave, ServiceError> {
        ensure_named(&wave)?;

        if route_id != wave.id {
            tracing::debug!(%route_id, body_id = %wave.id, "Rejected update with mismatched ids");
            return Err(ServiceError::InvalidArgument(ID_MISMATCH_MESSAGE.to_string()));
        }

        if !self.repo.exists(route_id).await? {
            return Err(ServiceError::NotFound(route_id));
        }

        let updated = self.repo.update(&wave).await?;
        tracing::info!(id = %updated.id, name = %updated.name, "Updated wave");
        Ok(updated)
    }

    /// Whether a wave with this id exists.
    pub async fn exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.repo.exists(id).await?)
    }
}

fn ensure_named(wave: &Wave) -> Result<(), ServiceError> {
    if wave.has_blank_name() {
        tracing::debug!(id = %wave.id, "Rejected wave with blank name");
        return Err(ServiceError::InvalidArgument(BLANK_NAME_MESSAGE.to_string()));
    }
    Ok(())
}
