//! Shared utilities and common types for the Walky admin backend.
//!
//! This crate provides functionality used across all other crates:
//! - Coordinate, radius and polygon range validation
//! - Required text field validation

pub mod validation;
