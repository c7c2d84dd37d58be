//! GeoJSON codec for geofence export and place-search import.
//!
//! Export produces a `Feature` per geofence (a `Point` for circles, a closed
//! `Polygon` ring otherwise). Import turns a place-search result into a
//! [`GeometryPatch`], downsampling detailed boundary rings and falling back to a
//! circle whenever the boundary is missing, malformed or too sparse.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::{Coordinate, Geofence, GeofenceGeometry, GeometryPatch, PlaceSearchResult};
use shared::validation::{validate_latitude, validate_longitude, MIN_POLYGON_VERTICES};

/// Only every Nth coordinate of an imported boundary ring is kept.
pub const DOWNSAMPLE_STEP: usize = 10;

/// Download name used when exporting every geofence in view.
pub const COLLECTION_FILENAME: &str = "geofences.geojson";

/// Errors that can occur while exporting geofences.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Geofence {geofence_id} has invalid geometry: {source}")]
    InvalidGeometry {
        geofence_id: Uuid,
        source: ValidationErrors,
    },

    #[error("Failed to serialize GeoJSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A GeoJSON document ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub filename: String,
    pub body: String,
}

// ============================================================================
// Export
// ============================================================================

/// Converts a geofence into a GeoJSON `Feature`.
pub fn to_feature(geofence: &Geofence) -> Result<Feature, ExportError> {
    geofence
        .geometry
        .validate()
        .map_err(|source| ExportError::InvalidGeometry {
            geofence_id: geofence.id,
            source,
        })?;

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(geofence.id));
    properties.insert("name".to_string(), json!(geofence.name));
    properties.insert("description".to_string(), json!(geofence.description));
    properties.insert("status".to_string(), json!(geofence.status));
    properties.insert("campusId".to_string(), json!(geofence.campus_id));
    properties.insert("createdAt".to_string(), json!(geofence.created_at));
    properties.insert("updatedAt".to_string(), json!(geofence.updated_at));

    let value = match &geofence.geometry {
        GeofenceGeometry::Radius { center, radius } => {
            properties.insert("radius".to_string(), json!(radius));
            Value::Point(center.to_position())
        }
        GeofenceGeometry::Polygon { polygon, .. } => {
            let ring = polygon.iter().map(|v| v.to_position()).collect();
            Value::Polygon(vec![close_ring(ring)])
        }
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Converts geofences into a `FeatureCollection`, preserving input order.
pub fn to_feature_collection(geofences: &[Geofence]) -> Result<FeatureCollection, ExportError> {
    let features = geofences
        .iter()
        .map(to_feature)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Builds the download for a single geofence.
pub fn export_geofence(geofence: &Geofence) -> Result<ExportDocument, ExportError> {
    let feature = to_feature(geofence)?;
    Ok(ExportDocument {
        filename: export_filename(&geofence.name),
        body: serde_json::to_string_pretty(&feature)?,
    })
}

/// Builds the download for every geofence in view.
pub fn export_collection(geofences: &[Geofence]) -> Result<ExportDocument, ExportError> {
    let collection = to_feature_collection(geofences)?;
    Ok(ExportDocument {
        filename: COLLECTION_FILENAME.to_string(),
        body: serde_json::to_string_pretty(&collection)?,
    })
}

/// Download filename for a geofence: whitespace runs become `_`.
pub fn export_filename(name: &str) -> String {
    let stem = name.split_whitespace().collect::<Vec<_>>().join("_");
    if stem.is_empty() {
        "geofence.geojson".to_string()
    } else {
        format!("{}.geojson", stem)
    }
}

/// Repeats the first position at the end unless the ring is already closed.
pub fn close_ring(mut ring: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = first.clone();
            ring.push(first);
        }
    }
    ring
}

// ============================================================================
// Import
// ============================================================================

/// Keeps positions whose index is a multiple of [`DOWNSAMPLE_STEP`].
pub fn downsample_ring<T: Clone>(ring: &[T]) -> Vec<T> {
    ring.iter().step_by(DOWNSAMPLE_STEP).cloned().collect()
}

/// Turns a place-search result into a geometry patch.
///
/// A usable `Polygon`/`MultiPolygon` boundary becomes a polygon patch; anything
/// else becomes a circle at the result's point with `current_radius`.
pub fn from_search_result(result: &PlaceSearchResult, current_radius: f64) -> GeometryPatch {
    if let Some(ring) = result.geojson.as_ref().and_then(boundary_ring) {
        let sampled = open_ring(downsample_ring(&ring));
        if sampled.len() >= MIN_POLYGON_VERTICES {
            tracing::debug!(
                place = %result.display_name,
                ring_len = ring.len(),
                vertices = sampled.len(),
                "Imported boundary polygon"
            );
            return GeometryPatch::polygon(sampled);
        }
        tracing::debug!(
            place = %result.display_name,
            ring_len = ring.len(),
            "Boundary too sparse after downsampling, using radius"
        );
    }

    GeometryPatch::Radius {
        center: result.point(),
        radius: current_radius,
    }
}

/// Reads back a feature produced by [`to_feature`].
///
/// Points become circles (using the `radius` property when present), polygons
/// keep every vertex of their first ring. Other geometries yield `None`.
pub fn from_feature(feature: &Feature, current_radius: f64) -> Option<GeometryPatch> {
    let geometry = feature.geometry.as_ref()?;
    match &geometry.value {
        Value::Point(position) => {
            let center = parse_position(position)?;
            let radius = feature
                .property("radius")
                .and_then(|r| r.as_f64())
                .unwrap_or(current_radius);
            Some(GeometryPatch::Radius { center, radius })
        }
        Value::Polygon(rings) => {
            let vertices = open_ring(parse_ring(rings.first()?)?);
            Some(GeometryPatch::polygon(vertices))
        }
        _ => None,
    }
}

/// Extracts the outer ring of the first polygon in a boundary geometry.
fn boundary_ring(value: &serde_json::Value) -> Option<Vec<Coordinate>> {
    let geometry = Geometry::from_json_value(value.clone()).ok()?;
    let ring = match &geometry.value {
        Value::Polygon(rings) => rings.first()?,
        Value::MultiPolygon(polygons) => polygons.first()?.first()?,
        _ => return None,
    };
    parse_ring(ring)
}

/// Converts `[lng, lat]` positions; any malformed position rejects the ring.
fn parse_ring(positions: &[Vec<f64>]) -> Option<Vec<Coordinate>> {
    positions.iter().map(|p| parse_position(p)).collect()
}

fn parse_position(position: &[f64]) -> Option<Coordinate> {
    let coordinate = Coordinate::from_position(position)?;
    validate_latitude(coordinate.latitude).ok()?;
    validate_longitude(coordinate.longitude).ok()?;
    Some(coordinate)
}

/// Drops a trailing vertex that repeats the first one.
fn open_ring(mut vertices: Vec<Coordinate>) -> Vec<Coordinate> {
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}
