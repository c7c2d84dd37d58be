//! HTTP route handlers.

pub mod geofences;
pub mod health;
pub mod places;
