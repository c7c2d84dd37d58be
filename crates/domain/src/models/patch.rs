//! Geometry patches emitted by interactive edits and imports.

use serde::{Deserialize, Serialize};

use super::coordinate::{bounding_box_center, Coordinate};
use super::geofence::{GeofenceGeometry, GeofenceType};

/// A partial geometry update applied to the canonical geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryPatch {
    Radius {
        center: Coordinate,
        radius: f64,
    },
    Polygon {
        center: Coordinate,
        polygon: Vec<Coordinate>,
    },
    /// The drawn shape was removed; the geofence has no geometry.
    Cleared,
}

impl GeometryPatch {
    /// Polygon patch centered on the vertices' bounding box.
    ///
    /// An empty vertex list has no shape and becomes [`GeometryPatch::Cleared`].
    pub fn polygon(vertices: Vec<Coordinate>) -> Self {
        match bounding_box_center(&vertices) {
            Some(center) => GeometryPatch::Polygon {
                center,
                polygon: vertices,
            },
            None => GeometryPatch::Cleared,
        }
    }

    pub fn kind(&self) -> Option<GeofenceType> {
        match self {
            GeometryPatch::Radius { .. } => Some(GeofenceType::Radius),
            GeometryPatch::Polygon { .. } => Some(GeofenceType::Polygon),
            GeometryPatch::Cleared => None,
        }
    }

    pub fn into_geometry(self) -> Option<GeofenceGeometry> {
        match self {
            GeometryPatch::Radius { center, radius } => {
                Some(GeofenceGeometry::Radius { center, radius })
            }
            GeometryPatch::Polygon { center, polygon } => {
                Some(GeofenceGeometry::Polygon { center, polygon })
            }
            GeometryPatch::Cleared => None,
        }
    }
}

impl From<GeofenceGeometry> for GeometryPatch {
    fn from(geometry: GeofenceGeometry) -> Self {
        match geometry {
            GeofenceGeometry::Radius { center, radius } => GeometryPatch::Radius { center, radius },
            GeofenceGeometry::Polygon { center, polygon } => {
                GeometryPatch::Polygon { center, polygon }
            }
        }
    }
}
