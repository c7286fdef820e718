//! REST API Routes Module
//!
//! Route handlers for the map tile API:
//! - Tile queries (clustered or individual mode by zoom)
//! - Cluster photo pagination
//! - Album overview and photo geo events
//! - Health check endpoints
//! - CORS support for browser-based map clients

pub mod albums;
pub mod clusters;
pub mod health;
pub mod tiles;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the full API router with tracing and CORS layers applied.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/map/tiles", get(tiles::get_tile))
        .route(
            "/api/v1/map/clusters/:cluster_id/photos",
            get(clusters::get_cluster_photos),
        )
        .route(
            "/api/v1/map/albums/:album_id/overview",
            get(albums::get_album_overview),
        )
        .route(
            "/api/v1/map/albums/:album_id/photos",
            post(albums::record_photo_event),
        )
        .route("/health/ping", get(health::ping))
        .route("/health/live", get(health::live))
        .route("/health/cache", get(health::cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
