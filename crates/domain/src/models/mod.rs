//! Domain models for the Walky admin geofence editor.

pub mod coordinate;
pub mod geofence;
pub mod patch;
pub mod place;
pub mod shape;

pub use coordinate::{bounding_box_center, Bounds, Coordinate};
pub use geofence::{
    Geofence, GeofenceGeometry, GeofenceInput, GeofenceStatus, GeofenceType, GeofenceUpdate,
};
pub use patch::GeometryPatch;
pub use place::PlaceSearchResult;
pub use shape::{DrawnShape, ScreenPoint, ShapeEvent, ShapeId, ShapeStyle};
