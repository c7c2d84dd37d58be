//! Domain layer for the Walky admin backend.
//!
//! This crate contains:
//! - Geofence models (tagged circle/polygon geometry, patches, drawn shapes)
//! - The GeoJSON codec used for export and place-search import
//! - The shape synchronizer and geofence form controller
//! - Contracts for the geofence store, place search and map surface

pub mod models;
pub mod services;
