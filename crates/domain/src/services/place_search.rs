//! Place-search contract and the debounced search used while typing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::models::PlaceSearchResult;

/// Quiet period before a query is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlaceSearchError {
    #[error("Place search request failed: {0}")]
    Request(String),

    #[error("Place search timed out")]
    Timeout,

    #[error("Invalid place search response: {0}")]
    InvalidResponse(String),
}

/// Geocoding provider.
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Looks up places matching a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<PlaceSearchResult>, PlaceSearchError>;
}

/// Result of a debounced search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<PlaceSearchResult>),
    /// A newer query or a closed session superseded this one.
    Discarded,
    Failed(PlaceSearchError),
}

/// Debounces queries so only the most recent one reaches the provider.
///
/// Each call cancels the one before it. Cancelling the parent token
/// discards every pending and future query.
pub struct DebouncedSearch {
    provider: Arc<dyn PlaceSearch>,
    debounce: Duration,
    parent: CancellationToken,
    pending: Mutex<Option<CancellationToken>>,
}

impl DebouncedSearch {
    pub fn new(provider: Arc<dyn PlaceSearch>, debounce: Duration) -> Self {
        Self::with_parent(provider, debounce, CancellationToken::new())
    }

    pub fn with_parent(
        provider: Arc<dyn PlaceSearch>,
        debounce: Duration,
        parent: CancellationToken,
    ) -> Self {
        Self {
            provider,
            debounce,
            parent,
            pending: Mutex::new(None),
        }
    }

    /// Waits out the debounce period, then queries the provider.
    ///
    /// A blank query clears pending work and yields no results right away.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let token = self.parent.child_token();
        if let Some(previous) = self.pending.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::Results(Vec::new());
        }

        tokio::select! {
            _ = token.cancelled() => return SearchOutcome::Discarded,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => return SearchOutcome::Discarded,
            result = self.provider.search(query) => result,
        };

        if token.is_cancelled() {
            return SearchOutcome::Discarded;
        }

        match result {
            Ok(results) => {
                tracing::debug!(query = %query, results = results.len(), "Place search completed");
                SearchOutcome::Results(results)
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Place search failed");
                SearchOutcome::Failed(e)
            }
        }
    }

    /// Cancels the pending query, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }
}

/// Place search for development and testing.
///
/// Returns a fixed result list and counts how often it was queried.
#[derive(Debug, Clone, Default)]
pub struct MockPlaceSearch {
    pub results: Vec<PlaceSearchResult>,
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    /// Simulated network latency.
    pub latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockPlaceSearch {
    pub fn new(results: Vec<PlaceSearchResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of queries that reached the provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PlaceSearch for MockPlaceSearch {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSearchResult>, PlaceSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.simulate_failure {
            tracing::warn!(query = %query, "Mock place search simulating failure");
            return Err(PlaceSearchError::Request("Simulated failure".to_string()));
        }

        tracing::info!(query = %query, results = self.results.len(), "Mock: returning place results");
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn central_park() -> PlaceSearchResult {
        PlaceSearchResult {
            display_name: "Central Park, New York".to_string(),
            latitude: 40.7826,
            longitude: -73.9656,
            geojson: None,
        }
    }

    fn debounced(mock: &MockPlaceSearch) -> DebouncedSearch {
        DebouncedSearch::new(Arc::new(mock.clone()), DEFAULT_DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_after_debounce() {
        let mock = MockPlaceSearch::new(vec![central_park()]);
        let search = debounced(&mock);

        let outcome = search.search("Central Park").await;
        assert_eq!(outcome, SearchOutcome::Results(vec![central_park()]));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_query_supersedes_pending() {
        let mock = MockPlaceSearch::new(vec![central_park()]);
        let search = debounced(&mock);

        let first = search.search("Cen");
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search.search("Central Park").await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, SearchOutcome::Discarded);
        assert_eq!(second, SearchOutcome::Results(vec![central_park()]));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_request_discarded() {
        let mock = MockPlaceSearch::new(vec![central_park()]).with_latency(Duration::from_secs(2));
        let search = debounced(&mock);

        let first = search.search("Central");
        let second = async {
            // Past the debounce, while the first request is in flight.
            tokio::time::sleep(Duration::from_millis(900)).await;
            search.search("Central Park").await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, SearchOutcome::Discarded);
        assert!(matches!(second, SearchOutcome::Results(_)));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_returns_immediately() {
        let mock = MockPlaceSearch::new(vec![central_park()]);
        let search = debounced(&mock);

        assert_eq!(search.search("   ").await, SearchOutcome::Results(Vec::new()));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_discards() {
        let mock = MockPlaceSearch::new(vec![central_park()]);
        let parent = CancellationToken::new();
        let search =
            DebouncedSearch::with_parent(Arc::new(mock.clone()), DEFAULT_DEBOUNCE, parent.clone());

        parent.cancel();
        assert_eq!(search.search("Central Park").await, SearchOutcome::Discarded);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_surfaces() {
        let mock = MockPlaceSearch::failing();
        let search = debounced(&mock);

        assert_eq!(
            search.search("Central Park").await,
            SearchOutcome::Failed(PlaceSearchError::Request("Simulated failure".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let mock = MockPlaceSearch::new(vec![central_park()]);
        let search = debounced(&mock);

        let pending = search.search("Central Park");
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            search.cancel().await;
        };
        let (outcome, _) = tokio::join!(pending, cancel);

        assert_eq!(outcome, SearchOutcome::Discarded);
        assert_eq!(mock.calls(), 0);
    }
}
