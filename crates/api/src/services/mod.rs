//! External service integrations.

pub mod place_search;

pub use place_search::NominatimClient;
