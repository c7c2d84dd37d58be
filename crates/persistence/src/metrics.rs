//! Geofence store metrics.
//!
//! Every store call is counted and timed under its query name and the
//! outcome it produced, using the same classification the store reports
//! to callers.

use domain::services::StoreError;
use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// How a store call ended, as exported in the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Ok,
    NotFound,
    Rejected,
    Unavailable,
    Internal,
}

impl QueryOutcome {
    pub fn of<T>(result: &Result<T, StoreError>) -> Self {
        match result {
            Ok(_) => QueryOutcome::Ok,
            Err(StoreError::NotFound(_)) => QueryOutcome::NotFound,
            Err(StoreError::Rejected(_)) => QueryOutcome::Rejected,
            Err(StoreError::Unavailable(_)) => QueryOutcome::Unavailable,
            Err(StoreError::Internal(_)) => QueryOutcome::Internal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryOutcome::Ok => "ok",
            QueryOutcome::NotFound => "not_found",
            QueryOutcome::Rejected => "rejected",
            QueryOutcome::Unavailable => "unavailable",
            QueryOutcome::Internal => "internal",
        }
    }
}

/// Record database connection pool metrics.
///
/// Called from the readiness check so every scrape sees fresh pool gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one store call.
///
/// ```ignore
/// let timer = QueryTimer::new("find_geofence_by_id");
/// let result = self.find_by_id(id).await.map_err(store_error);
/// timer.finish(&result)
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the call's duration and outcome, and returns the outcome.
    pub fn finish<T>(self, result: &Result<T, StoreError>) -> QueryOutcome {
        let outcome = QueryOutcome::of(result);
        counter!(
            "geofence_store_queries_total",
            "query" => self.query,
            "outcome" => outcome.as_str()
        )
        .increment(1);
        histogram!(
            "geofence_store_query_duration_seconds",
            "query" => self.query,
            "outcome" => outcome.as_str()
        )
        .record(self.start.elapsed().as_secs_f64());

        if outcome != QueryOutcome::Ok && outcome != QueryOutcome::NotFound {
            tracing::debug!(query = self.query, outcome = outcome.as_str(), "Store call failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_outcome_follows_store_error() {
        let cases: Vec<(Result<(), StoreError>, &str)> = vec![
            (Ok(()), "ok"),
            (Err(StoreError::NotFound(Uuid::nil())), "not_found"),
            (Err(StoreError::Rejected("check".into())), "rejected"),
            (Err(StoreError::Unavailable("pool".into())), "unavailable"),
            (Err(StoreError::Internal("decode".into())), "internal"),
        ];
        for (result, label) in cases {
            assert_eq!(QueryOutcome::of(&result).as_str(), label);
        }
    }

    #[test]
    fn test_finish_without_recorder_returns_outcome() {
        let result: Result<u64, StoreError> = Err(StoreError::Unavailable("timed out".into()));
        assert_eq!(
            QueryTimer::new("delete_geofence").finish(&result),
            QueryOutcome::Unavailable
        );
        assert_eq!(
            QueryTimer::new("list_geofences").finish(&Ok::<_, StoreError>(Vec::<u8>::new())),
            QueryOutcome::Ok
        );
    }
}
