//! Persistence layer for the Walky admin backend.
//!
//! This crate contains:
//! - Database connection management
//! - Query metrics
//! - Entity definitions (database row mappings)
//! - The PostgreSQL geofence store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
