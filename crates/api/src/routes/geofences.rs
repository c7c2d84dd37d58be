//! Geofence management route handlers.
//!
//! CRUD over the geofence store plus GeoJSON download endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    Geofence, GeofenceInput, GeofenceUpdate, ListGeofencesQuery, ListGeofencesResponse,
};
use domain::services::{export_collection, export_geofence, ExportDocument};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::record_geofences_exported;

/// Media type of exported documents.
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// Create geofence routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/geofences", get(list_geofences))
        .route(
            "/geofences/:geofence_id",
            get(get_geofence)
                .patch(update_geofence)
                .delete(delete_geofence),
        )
        .route("/geofences/:geofence_id/export", get(export_single))
        .route(
            "/campuses/:campus_id/geofences",
            get(list_campus_geofences).post(create_geofence),
        )
        .route("/campuses/:campus_id/geofences/export", get(export_campus))
}

/// List geofences, optionally for one campus.
///
/// GET /api/v1/geofences?campus_id=
async fn list_geofences(
    State(state): State<AppState>,
    Query(query): Query<ListGeofencesQuery>,
) -> Result<Json<ListGeofencesResponse>, ApiError> {
    let geofences = state.store.list(query.campus_id).await?;
    Ok(Json(list_response(geofences)))
}

/// List the geofences of a campus.
///
/// GET /api/v1/campuses/:campus_id/geofences
async fn list_campus_geofences(
    State(state): State<AppState>,
    Path(campus_id): Path<Uuid>,
) -> Result<Json<ListGeofencesResponse>, ApiError> {
    let geofences = state.store.list(Some(campus_id)).await?;
    Ok(Json(list_response(geofences)))
}

/// Create a geofence under a campus.
///
/// POST /api/v1/campuses/:campus_id/geofences
async fn create_geofence(
    State(state): State<AppState>,
    Path(campus_id): Path<Uuid>,
    Json(input): Json<GeofenceInput>,
) -> Result<(StatusCode, Json<Geofence>), ApiError> {
    input.validate()?;

    let geofence = state.store.create(campus_id, input).await?;

    info!(
        geofence_id = %geofence.id,
        campus_id = %campus_id,
        geofence_type = geofence.kind().as_str(),
        "Geofence created"
    );

    Ok((StatusCode::CREATED, Json(geofence)))
}

/// Get a single geofence.
///
/// GET /api/v1/geofences/:geofence_id
async fn get_geofence(
    State(state): State<AppState>,
    Path(geofence_id): Path<Uuid>,
) -> Result<Json<Geofence>, ApiError> {
    Ok(Json(state.store.get(geofence_id).await?))
}

/// Partially update a geofence. A present geometry replaces the old one.
///
/// PATCH /api/v1/geofences/:geofence_id
async fn update_geofence(
    State(state): State<AppState>,
    Path(geofence_id): Path<Uuid>,
    Json(update): Json<GeofenceUpdate>,
) -> Result<Json<Geofence>, ApiError> {
    update.validate()?;

    let geofence = state.store.update(geofence_id, update).await?;

    info!(
        geofence_id = %geofence.id,
        geofence_type = geofence.kind().as_str(),
        "Geofence updated"
    );

    Ok(Json(geofence))
}

/// Delete a geofence.
///
/// DELETE /api/v1/geofences/:geofence_id
async fn delete_geofence(
    State(state): State<AppState>,
    Path(geofence_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(geofence_id).await?;
    info!(geofence_id = %geofence_id, "Geofence deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Download one geofence as a GeoJSON Feature.
///
/// GET /api/v1/geofences/:geofence_id/export
async fn export_single(
    State(state): State<AppState>,
    Path(geofence_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let geofence = state.store.get(geofence_id).await?;
    let document = export_geofence(&geofence)?;
    record_geofences_exported("single", 1);
    Ok(download(document))
}

/// Download every geofence of a campus as a FeatureCollection.
///
/// GET /api/v1/campuses/:campus_id/geofences/export
async fn export_campus(
    State(state): State<AppState>,
    Path(campus_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let geofences = state.store.list(Some(campus_id)).await?;
    let document = export_collection(&geofences)?;
    record_geofences_exported("collection", geofences.len());
    info!(campus_id = %campus_id, count = geofences.len(), "Geofences exported");
    Ok(download(document))
}

fn list_response(geofences: Vec<Geofence>) -> ListGeofencesResponse {
    let total = geofences.len();
    ListGeofencesResponse { geofences, total }
}

/// Builds an attachment response for an export document.
fn download(document: ExportDocument) -> Response {
    let disposition = content_disposition(&document.filename);
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(GEOJSON_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    )
        .into_response()
}

/// `attachment; filename="..."`, falling back to the collection name when the
/// geofence name cannot be carried in a header.
fn content_disposition(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .ok()
        .filter(|_| safe.is_ascii())
        .unwrap_or_else(|| {
            HeaderValue::from_static("attachment; filename=\"geofence.geojson\"")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("Main_Gate.geojson"),
            "attachment; filename=\"Main_Gate.geojson\""
        );
    }

    #[test]
    fn test_content_disposition_strips_quotes() {
        assert_eq!(
            content_disposition("The_\"Quad\".geojson"),
            "attachment; filename=\"The_Quad.geojson\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_falls_back() {
        assert_eq!(
            content_disposition("Café_Plaza.geojson"),
            "attachment; filename=\"geofence.geojson\""
        );
    }

    #[test]
    fn test_list_response_total() {
        assert_eq!(list_response(Vec::new()).total, 0);
    }
}
