//! Geofence entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use domain::models::{Coordinate, Geofence, GeofenceGeometry, GeofenceStatus, GeofenceType};

/// Database row mapping for the geofences table.
///
/// Exactly one of `radius_meters` and `polygon` is set, matching
/// `geofence_type`. `polygon` is a JSONB array of `{latitude, longitude}`.
#[derive(Debug, Clone, FromRow)]
pub struct GeofenceEntity {
    pub id: Uuid,
    pub campus_id: Uuid,
    pub name: String,
    pub description: String,
    pub geofence_type: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_meters: Option<f64>,
    pub polygon: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row that does not describe a valid geofence.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Geofence {id} has unknown type '{value}'")]
    UnknownType { id: Uuid, value: String },

    #[error("Geofence {id} has unknown status '{value}'")]
    UnknownStatus { id: Uuid, value: String },

    #[error("Radius geofence {0} has no radius")]
    MissingRadius(Uuid),

    #[error("Polygon geofence {0} has no vertices")]
    MissingPolygon(Uuid),

    #[error("Geofence {id} has malformed polygon: {source}")]
    MalformedPolygon { id: Uuid, source: serde_json::Error },
}

/// Column values for a geometry, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryColumns {
    pub geofence_type: &'static str,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_meters: Option<f64>,
    pub polygon: Option<serde_json::Value>,
}

impl GeometryColumns {
    pub fn from_geometry(geometry: &GeofenceGeometry) -> Result<Self, serde_json::Error> {
        let center = geometry.center();
        let (radius_meters, polygon) = match geometry {
            GeofenceGeometry::Radius { radius, .. } => (Some(*radius), None),
            GeofenceGeometry::Polygon { polygon, .. } => (None, Some(serde_json::to_value(polygon)?)),
        };
        Ok(Self {
            geofence_type: geometry.kind().as_str(),
            center_latitude: center.latitude,
            center_longitude: center.longitude,
            radius_meters,
            polygon,
        })
    }
}

impl TryFrom<GeofenceEntity> for Geofence {
    type Error = EntityError;

    fn try_from(entity: GeofenceEntity) -> Result<Self, Self::Error> {
        let id = entity.id;
        let center = Coordinate::new(entity.center_latitude, entity.center_longitude);

        let geometry = match GeofenceType::parse(&entity.geofence_type) {
            Some(GeofenceType::Radius) => GeofenceGeometry::Radius {
                center,
                radius: entity.radius_meters.ok_or(EntityError::MissingRadius(id))?,
            },
            Some(GeofenceType::Polygon) => {
                let value = entity.polygon.ok_or(EntityError::MissingPolygon(id))?;
                let polygon: Vec<Coordinate> = serde_json::from_value(value)
                    .map_err(|source| EntityError::MalformedPolygon { id, source })?;
                GeofenceGeometry::Polygon { center, polygon }
            }
            None => {
                return Err(EntityError::UnknownType {
                    id,
                    value: entity.geofence_type,
                })
            }
        };

        let status = GeofenceStatus::parse(&entity.status).ok_or_else(|| {
            EntityError::UnknownStatus {
                id,
                value: entity.status.clone(),
            }
        })?;

        Ok(Self {
            id,
            campus_id: entity.campus_id,
            name: entity.name,
            description: entity.description,
            geometry,
            status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
