//! Place-search results consumed by the geofence importer.

use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use super::patch::GeometryPatch;

/// A named location returned by the place-search provider.
///
/// `geojson` holds the provider's boundary geometry untouched; the importer
/// reads it leniently and falls back to a circle when it is unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSearchResult {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson: Option<serde_json::Value>,
}

impl PlaceSearchResult {
    pub fn point(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Query parameters for place search.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceSearchQuery {
    pub q: String,
    /// Radius applied when a result has no usable boundary.
    pub radius: Option<f64>,
}

/// A search result paired with the geometry it would import as.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceImportPreview {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub patch: GeometryPatch,
}

/// Response for place search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSearchResponse {
    pub results: Vec<PlaceImportPreview>,
    pub total: usize,
}
