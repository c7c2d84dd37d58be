//! Place-search route handlers.
//!
//! Each result is returned with the geometry it would import as, so the
//! editor can preview a boundary before applying it.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, warn};
use validator::ValidationErrors;

use domain::models::{PlaceImportPreview, PlaceSearchQuery, PlaceSearchResponse};
use domain::services::from_search_result;
use shared::validation::validate_radius;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::record_place_search;

/// Create place-search routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/places/search", get(search_places))
}

/// Search places and preview their import geometry.
///
/// GET /api/v1/places/search?q=&radius=
async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PlaceSearchQuery>,
) -> Result<Json<PlaceSearchResponse>, ApiError> {
    let radius = query
        .radius
        .unwrap_or(state.config.geofence.default_radius_meters);
    if let Err(e) = validate_radius(radius) {
        let mut errors = ValidationErrors::new();
        errors.add("radius", e);
        return Err(errors.into());
    }

    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(PlaceSearchResponse {
            results: Vec::new(),
            total: 0,
        }));
    }

    let results = match state.places.search(q).await {
        Ok(results) => {
            record_place_search("ok");
            results
        }
        Err(e) => {
            record_place_search("error");
            warn!(query = %q, error = %e, "Place search failed");
            return Err(e.into());
        }
    };

    let previews: Vec<PlaceImportPreview> = results
        .iter()
        .map(|result| PlaceImportPreview {
            display_name: result.display_name.clone(),
            latitude: result.latitude,
            longitude: result.longitude,
            patch: from_search_result(result, radius),
        })
        .collect();

    debug!(query = %q, count = previews.len(), "Place search completed");

    Ok(Json(PlaceSearchResponse {
        total: previews.len(),
        results: previews,
    }))
}
