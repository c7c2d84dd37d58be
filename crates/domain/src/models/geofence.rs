//! Geofence domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::coordinate::{bounding_box_center, Coordinate};
use shared::validation::{
    validate_latitude, validate_longitude, validate_polygon, validate_radius, validate_required,
};

/// A campus zone persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: Uuid,
    pub campus_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub geometry: GeofenceGeometry,
    pub status: GeofenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Geofence {
    pub fn kind(&self) -> GeofenceType {
        self.geometry.kind()
    }

    pub fn center(&self) -> Coordinate {
        self.geometry.center()
    }
}

/// Discriminates which geometry is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceType {
    Radius,
    Polygon,
}

impl GeofenceType {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceType::Radius => "radius",
            GeofenceType::Polygon => "polygon",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "radius" => Some(GeofenceType::Radius),
            "polygon" => Some(GeofenceType::Polygon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceStatus {
    #[default]
    Active,
    Inactive,
}

impl GeofenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeofenceStatus::Active => "active",
            GeofenceStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GeofenceStatus::Active),
            "inactive" => Some(GeofenceStatus::Inactive),
            _ => None,
        }
    }
}

/// Geometry of a geofence, tagged by `type`.
///
/// `center` is present for both shapes. For polygons it is the bounding-box
/// centroid of the vertices and is recomputed whenever the vertices change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", from = "RawGeometry")]
pub enum GeofenceGeometry {
    Radius {
        center: Coordinate,
        radius: f64,
    },
    Polygon {
        center: Coordinate,
        polygon: Vec<Coordinate>,
    },
}

/// Incoming geometry. A client-supplied polygon center is ignored.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawGeometry {
    Radius {
        center: Coordinate,
        radius: f64,
    },
    Polygon {
        #[serde(default, rename = "center")]
        _center: Option<Coordinate>,
        polygon: Vec<Coordinate>,
    },
}

impl From<RawGeometry> for GeofenceGeometry {
    fn from(raw: RawGeometry) -> Self {
        match raw {
            RawGeometry::Radius { center, radius } => GeofenceGeometry::radius(center, radius),
            RawGeometry::Polygon { polygon, .. } => GeofenceGeometry::polygon(polygon),
        }
    }
}

impl GeofenceGeometry {
    pub fn radius(center: Coordinate, radius: f64) -> Self {
        GeofenceGeometry::Radius { center, radius }
    }

    /// Builds a polygon geometry from an open ring of vertices.
    pub fn polygon(vertices: Vec<Coordinate>) -> Self {
        let center = bounding_box_center(&vertices).unwrap_or_default();
        GeofenceGeometry::Polygon {
            center,
            polygon: vertices,
        }
    }

    pub fn kind(&self) -> GeofenceType {
        match self {
            GeofenceGeometry::Radius { .. } => GeofenceType::Radius,
            GeofenceGeometry::Polygon { .. } => GeofenceType::Polygon,
        }
    }

    pub fn center(&self) -> Coordinate {
        match self {
            GeofenceGeometry::Radius { center, .. } | GeofenceGeometry::Polygon { center, .. } => {
                *center
            }
        }
    }

    /// Adds field-level errors for every out-of-range value to `errors`.
    pub fn collect_errors(&self, errors: &mut ValidationErrors) {
        let center = self.center();
        if let Err(e) = validate_latitude(center.latitude) {
            errors.add("latitude", e);
        }
        if let Err(e) = validate_longitude(center.longitude) {
            errors.add("longitude", e);
        }

        match self {
            GeofenceGeometry::Radius { radius, .. } => {
                if let Err(e) = validate_radius(*radius) {
                    errors.add("radius", e);
                }
            }
            GeofenceGeometry::Polygon { polygon, .. } => {
                if let Err(e) = validate_polygon(polygon) {
                    errors.add("polygon", e);
                }
                let out_of_range = polygon.iter().find_map(|v| {
                    validate_latitude(v.latitude)
                        .and_then(|_| validate_longitude(v.longitude))
                        .err()
                });
                if let Some(e) = out_of_range {
                    errors.add("polygon", e);
                }
            }
        }
    }
}

impl Validate for GeofenceGeometry {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect_errors(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Full payload for creating a geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceInput {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub geometry: GeofenceGeometry,
    #[serde(default)]
    pub status: GeofenceStatus,
}

impl Validate for GeofenceInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_required(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_required(&self.description) {
            errors.add("description", e);
        }
        self.geometry.collect_errors(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update payload. The geometry is replaced as a whole when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: Option<GeofenceGeometry>,
    pub status: Option<GeofenceStatus>,
}

impl Validate for GeofenceUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(Err(e)) = self.name.as_deref().map(validate_required) {
            errors.add("name", e);
        }
        if let Some(Err(e)) = self.description.as_deref().map(validate_required) {
            errors.add("description", e);
        }
        if let Some(ref geometry) = self.geometry {
            geometry.collect_errors(&mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<GeofenceInput> for GeofenceUpdate {
    fn from(input: GeofenceInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            geometry: Some(input.geometry),
            status: Some(input.status),
        }
    }
}

/// Response for listing geofences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGeofencesResponse {
    pub geofences: Vec<Geofence>,
    pub total: usize,
}

/// Query parameters for listing geofences.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGeofencesQuery {
    pub campus_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_gate() -> GeofenceInput {
        GeofenceInput {
            name: "Main Gate".to_string(),
            description: "North entrance".to_string(),
            geometry: GeofenceGeometry::radius(Coordinate::new(25.7617, -80.1918), 100.0),
            status: GeofenceStatus::Active,
        }
    }

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 2.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(2.0, 0.0),
        ]
    }

    #[test]
    fn test_geofence_type_round_trip() {
        for kind in [GeofenceType::Radius, GeofenceType::Polygon] {
            assert_eq!(GeofenceType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(GeofenceType::parse("circle"), None);
    }

    #[test]
    fn test_geofence_status_default_active() {
        assert_eq!(GeofenceStatus::default(), GeofenceStatus::Active);
        assert_eq!(GeofenceStatus::parse("inactive"), Some(GeofenceStatus::Inactive));
    }

    #[test]
    fn test_polygon_center_is_bounding_box_center() {
        let geometry = GeofenceGeometry::polygon(square());
        assert_eq!(geometry.kind(), GeofenceType::Polygon);
        assert_eq!(geometry.center(), Coordinate::new(1.0, 1.0));
    }

    #[test]
    fn test_geofence_serializes_tagged_geometry() {
        let geofence = Geofence {
            id: Uuid::nil(),
            campus_id: Uuid::nil(),
            name: "Library".to_string(),
            description: "Quiet zone".to_string(),
            geometry: GeofenceGeometry::radius(Coordinate::new(1.0, 2.0), 50.0),
            status: GeofenceStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&geofence).unwrap();
        assert_eq!(json["type"], "radius");
        assert_eq!(json["radius"], 50.0);
        assert_eq!(json["center"]["latitude"], 1.0);
        assert_eq!(json["campusId"], Uuid::nil().to_string());
        assert!(json.get("polygon").is_none());

        let back: Geofence = serde_json::from_value(json).unwrap();
        assert_eq!(back, geofence);
    }

    #[test]
    fn test_input_deserialization_defaults_status() {
        let json = r#"{
            "name": "Quad",
            "description": "Central lawn",
            "type": "polygon",
            "center": {"latitude": 1.0, "longitude": 1.0},
            "polygon": [
                {"latitude": 0.0, "longitude": 0.0},
                {"latitude": 0.0, "longitude": 2.0},
                {"latitude": 2.0, "longitude": 2.0}
            ]
        }"#;

        let input: GeofenceInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.status, GeofenceStatus::Active);
        assert_eq!(input.geometry.kind(), GeofenceType::Polygon);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_polygon_center_recomputed_on_deserialize() {
        let json = r#"{
            "type": "polygon",
            "center": {"latitude": 50.0, "longitude": 50.0},
            "polygon": [
                {"latitude": 0.0, "longitude": 0.0},
                {"latitude": 0.0, "longitude": 2.0},
                {"latitude": 4.0, "longitude": 2.0}
            ]
        }"#;

        let geometry: GeofenceGeometry = serde_json::from_str(json).unwrap();
        assert_eq!(geometry.center(), Coordinate::new(2.0, 1.0));

        let without_center = r#"{"type": "polygon", "polygon": [
            {"latitude": 0.0, "longitude": 0.0},
            {"latitude": 0.0, "longitude": 2.0},
            {"latitude": 4.0, "longitude": 2.0}
        ]}"#;
        let geometry: GeofenceGeometry = serde_json::from_str(without_center).unwrap();
        assert_eq!(geometry.center(), Coordinate::new(2.0, 1.0));
    }

    #[test]
    fn test_input_validation_ok() {
        assert!(main_gate().validate().is_ok());
    }

    #[test]
    fn test_input_validation_empty_name() {
        let mut input = main_gate();
        input.name = "  ".to_string();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(!errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_input_validation_radius_range() {
        let mut input = main_gate();
        input.geometry = GeofenceGeometry::radius(Coordinate::new(25.0, -80.0), 10_001.0);
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("radius"));
    }

    #[test]
    fn test_input_validation_center_range() {
        let mut input = main_gate();
        input.geometry = GeofenceGeometry::radius(Coordinate::new(95.0, -200.0), 100.0);
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("latitude"));
        assert!(fields.contains_key("longitude"));
    }

    #[test]
    fn test_input_validation_too_few_vertices() {
        let mut input = main_gate();
        input.geometry = GeofenceGeometry::polygon(square()[..2].to_vec());
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field_errors()["polygon"][0].code, "polygon_vertices");
    }

    #[test]
    fn test_input_validation_vertex_out_of_range() {
        let mut vertices = square();
        vertices[2] = Coordinate::new(0.0, 181.0);
        let errors = GeofenceGeometry::polygon(vertices).validate().unwrap_err();
        assert_eq!(errors.field_errors()["polygon"][0].code, "longitude_range");
    }

    #[test]
    fn test_update_validation_only_checks_present_fields() {
        assert!(GeofenceUpdate::default().validate().is_ok());

        let update = GeofenceUpdate {
            description: Some(String::new()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_update_from_input_sets_every_field() {
        let update = GeofenceUpdate::from(main_gate());
        assert_eq!(update.name.as_deref(), Some("Main Gate"));
        assert_eq!(update.status, Some(GeofenceStatus::Active));
        assert!(matches!(
            update.geometry,
            Some(GeofenceGeometry::Radius { radius, .. }) if radius == 100.0
        ));
    }
}
