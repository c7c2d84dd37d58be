//! Geofence repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{Geofence, GeofenceInput, GeofenceUpdate};
use domain::services::{GeofenceStore, StoreError};

use crate::entities::{GeofenceEntity, GeometryColumns};
use crate::metrics::QueryTimer;

/// Repository for geofence-related database operations.
#[derive(Clone)]
pub struct GeofenceRepository {
    pool: PgPool,
}

impl GeofenceRepository {
    /// Creates a new GeofenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new geofence under a campus.
    pub async fn create(
        &self,
        campus_id: Uuid,
        input: &GeofenceInput,
    ) -> Result<GeofenceEntity, sqlx::Error> {
        let geometry = GeometryColumns::from_geometry(&input.geometry)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query_as::<_, GeofenceEntity>(
            r#"
            INSERT INTO geofences (campus_id, name, description, geofence_type,
                                   center_latitude, center_longitude, radius_meters,
                                   polygon, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(campus_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(geometry.geofence_type)
        .bind(geometry.center_latitude)
        .bind(geometry.center_longitude)
        .bind(geometry.radius_meters)
        .bind(geometry.polygon)
        .bind(input.status.as_str())
        .fetch_one(&self.pool)
        .await
    }

    /// Find geofence by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT * FROM geofences WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List geofences, newest first, optionally for one campus only.
    pub async fn list(&self, campus_id: Option<Uuid>) -> Result<Vec<GeofenceEntity>, sqlx::Error> {
        sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT * FROM geofences
            WHERE ($1::uuid IS NULL OR campus_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(campus_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Update a geofence (partial update).
    ///
    /// None values are preserved. A present geometry replaces every geometry
    /// column, so a circle turned into a polygon loses its radius.
    pub async fn update(
        &self,
        id: Uuid,
        update: &GeofenceUpdate,
    ) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        let geometry = update
            .geometry
            .as_ref()
            .map(GeometryColumns::from_geometry)
            .transpose()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query_as::<_, GeofenceEntity>(
            r#"
            UPDATE geofences SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                geofence_type = CASE WHEN $5 THEN $6 ELSE geofence_type END,
                center_latitude = CASE WHEN $5 THEN $7 ELSE center_latitude END,
                center_longitude = CASE WHEN $5 THEN $8 ELSE center_longitude END,
                radius_meters = CASE WHEN $5 THEN $9 ELSE radius_meters END,
                polygon = CASE WHEN $5 THEN $10 ELSE polygon END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.status.map(|s| s.as_str()))
        .bind(geometry.is_some())
        .bind(geometry.as_ref().map(|g| g.geofence_type))
        .bind(geometry.as_ref().map(|g| g.center_latitude))
        .bind(geometry.as_ref().map(|g| g.center_longitude))
        .bind(geometry.as_ref().and_then(|g| g.radius_meters))
        .bind(geometry.and_then(|g| g.polygon))
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a geofence.
    /// Returns the number of rows deleted (0 or 1).
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM geofences WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Maps database failures onto the store contract.
fn store_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_check_violation() => {
            StoreError::Rejected(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => {
            tracing::error!(error = %e, "Geofence query failed");
            StoreError::Internal(e.to_string())
        }
    }
}

fn to_domain(entity: GeofenceEntity) -> Result<Geofence, StoreError> {
    Geofence::try_from(entity).map_err(|e| {
        tracing::error!(error = %e, "Invalid geofence row");
        StoreError::Internal(e.to_string())
    })
}

#[async_trait::async_trait]
impl GeofenceStore for GeofenceRepository {
    async fn list(&self, campus_id: Option<Uuid>) -> Result<Vec<Geofence>, StoreError> {
        let timer = QueryTimer::new("list_geofences");
        let result: Result<Vec<Geofence>, StoreError> = GeofenceRepository::list(self, campus_id)
            .await
            .map_err(store_error)
            .and_then(|entities| entities.into_iter().map(to_domain).collect());
        timer.finish(&result);
        result
    }

    async fn get(&self, id: Uuid) -> Result<Geofence, StoreError> {
        let timer = QueryTimer::new("find_geofence_by_id");
        let result = self
            .find_by_id(id)
            .await
            .map_err(store_error)
            .and_then(|row| row.ok_or(StoreError::NotFound(id)))
            .and_then(to_domain);
        timer.finish(&result);
        result
    }

    async fn create(&self, campus_id: Uuid, input: GeofenceInput) -> Result<Geofence, StoreError> {
        let timer = QueryTimer::new("create_geofence");
        let result = GeofenceRepository::create(self, campus_id, &input)
            .await
            .map_err(store_error)
            .and_then(to_domain);
        timer.finish(&result);
        result
    }

    async fn update(&self, id: Uuid, update: GeofenceUpdate) -> Result<Geofence, StoreError> {
        let timer = QueryTimer::new("update_geofence");
        let result = GeofenceRepository::update(self, id, &update)
            .await
            .map_err(store_error)
            .and_then(|row| row.ok_or(StoreError::NotFound(id)))
            .and_then(to_domain);
        timer.finish(&result);
        result
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let timer = QueryTimer::new("delete_geofence");
        let result = match GeofenceRepository::delete(self, id).await.map_err(store_error) {
            Ok(0) => Err(StoreError::NotFound(id)),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        timer.finish(&result);
        result
    }
}
