//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod geofence;

pub use geofence::{EntityError, GeofenceEntity, GeometryColumns};
