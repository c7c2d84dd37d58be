use axum::{middleware, routing::get, Router};
use domain::services::{GeofenceStore, PlaceSearch, PlaceSearchError};
use persistence::repositories::GeofenceRepository;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{geofences, health, places};
use crate::services::NominatimClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn GeofenceStore>,
    pub places: Arc<dyn PlaceSearch>,
    pub config: Arc<Config>,
}

/// Wires the PostgreSQL store and the Nominatim client into the router.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, PlaceSearchError> {
    let places = NominatimClient::new(&config.place_search)?;
    let state = AppState {
        store: Arc::new(GeofenceRepository::new(pool.clone())),
        places: Arc::new(places),
        pool,
        config: Arc::new(config),
    };
    Ok(router(state))
}

/// Builds the router around an already assembled state.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development: any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        .merge(geofences::router())
        .merge(places::router());

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
