//! Geofence persistence contract.
//!
//! The editor only depends on this trait; the PostgreSQL repository in the
//! persistence crate is the production implementation.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Geofence, GeofenceInput, GeofenceUpdate};

/// Errors reported by a geofence store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Geofence not found: {0}")]
    NotFound(Uuid),

    #[error("Rejected by store: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Internal(String),
}

/// CRUD access to persisted geofences.
///
/// `id`, `created_at` and `updated_at` are assigned by the store.
#[async_trait::async_trait]
pub trait GeofenceStore: Send + Sync {
    /// List geofences, optionally restricted to one campus.
    async fn list(&self, campus_id: Option<Uuid>) -> Result<Vec<Geofence>, StoreError>;

    /// Fetch a single geofence.
    async fn get(&self, id: Uuid) -> Result<Geofence, StoreError>;

    /// Create a geofence under a campus.
    async fn create(&self, campus_id: Uuid, input: GeofenceInput) -> Result<Geofence, StoreError>;

    /// Apply a partial update.
    async fn update(&self, id: Uuid, update: GeofenceUpdate) -> Result<Geofence, StoreError>;

    /// Delete a geofence.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
