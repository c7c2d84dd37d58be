//! Nominatim place-search client.
//!
//! Queries `/search` with `polygon_geojson=1` so boundary polygons come back
//! alongside the point; the codec decides whether the boundary is usable.

use std::time::Duration;

use domain::models::PlaceSearchResult;
use domain::services::{PlaceSearch, PlaceSearchError};
use reqwest::{Client, Request};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::PlaceSearchConfig;

/// Nominatim `/search` row. Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct NominatimResult {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    geojson: Option<serde_json::Value>,
}

impl NominatimResult {
    fn into_place(self) -> Option<PlaceSearchResult> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        Some(PlaceSearchResult {
            display_name: self.display_name,
            latitude,
            longitude,
            geojson: self.geojson,
        })
    }
}

/// HTTP client for a Nominatim-compatible geocoder.
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    limit: u32,
    timeout_ms: u64,
}

impl NominatimClient {
    /// Creates a new client from configuration.
    pub fn new(config: &PlaceSearchConfig) -> Result<Self, PlaceSearchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| PlaceSearchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.result_limit.max(1),
            timeout_ms: config.timeout_ms,
        })
    }

    fn build_request(&self, query: &str) -> Result<Request, PlaceSearchError> {
        let limit = self.limit.to_string();
        self.client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("polygon_geojson", "1"),
                ("limit", limit.as_str()),
            ])
            .build()
            .map_err(|e| PlaceSearchError::Request(e.to_string()))
    }
}

/// Parses a Nominatim response body, skipping rows with unusable coordinates.
fn parse_results(body: &str) -> Result<Vec<PlaceSearchResult>, PlaceSearchError> {
    let rows: Vec<NominatimResult> = serde_json::from_str(body)
        .map_err(|e| PlaceSearchError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let total = rows.len();
    let results: Vec<PlaceSearchResult> = rows
        .into_iter()
        .filter_map(NominatimResult::into_place)
        .collect();

    if results.len() < total {
        warn!(
            skipped = total - results.len(),
            "Skipped place search rows with unparsable coordinates"
        );
    }
    Ok(results)
}

#[async_trait::async_trait]
impl PlaceSearch for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSearchResult>, PlaceSearchError> {
        let request = self.build_request(query)?;
        debug!(query = %query, url = %request.url(), "Sending place search request");

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                warn!(timeout_ms = self.timeout_ms, "Place search request timed out");
                PlaceSearchError::Timeout
            } else {
                PlaceSearchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaceSearchError::Request(format!(
                "Geocoder returned status: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlaceSearchError::InvalidResponse(e.to_string()))?;
        parse_results(&body)
    }
}
