//! Common validation utilities.

use validator::ValidationError;

/// Largest radius accepted for a circular geofence, in meters.
pub const MAX_RADIUS_METERS: f64 = 10_000.0;

/// Fewest vertices a polygon geofence may have.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a radius is positive and at most 10 km.
pub fn validate_radius(radius: f64) -> Result<(), ValidationError> {
    if radius > 0.0 && radius <= MAX_RADIUS_METERS {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be greater than 0 and at most 10000 meters".into());
        Err(err)
    }
}

/// Validates that a polygon has enough vertices to enclose an area.
pub fn validate_polygon<T>(vertices: &[T]) -> Result<(), ValidationError> {
    if vertices.len() >= MIN_POLYGON_VERTICES {
        Ok(())
    } else {
        let mut err = ValidationError::new("polygon_vertices");
        err.message = Some("Polygon must have at least 3 points".into());
        err.add_param("count".into(), &vertices.len());
        Err(err)
    }
}

/// Validates that a text field contains something other than whitespace.
pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        Err(err)
    } else {
        Ok(())
    }
}
