//! Health Check Endpoints
//!
//! Kubernetes-compatible probes plus a small cache statistics readout:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check with uptime
//! - /health/cache - Tile cache hit/miss counters
//!
//! No authentication required for health endpoints.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealthResponse {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

/// GET /health/ping - liveness probe.
pub async fn ping() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: None,
    })
}

/// GET /health/live - process alive check with uptime.
pub async fn live(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: Some(state.start_time.elapsed().as_secs()),
    })
}

/// GET /health/cache - tile cache effectiveness counters.
pub async fn cache(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.service.cache_stats();
    Json(CacheHealthResponse {
        hits: stats.hits,
        misses: stats.misses,
        hit_ratio: stats.hit_ratio(),
    })
}
