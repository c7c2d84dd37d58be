//! Repository implementations for database operations.

pub mod geofence;

pub use geofence::GeofenceRepository;
