//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::services::MapQueryService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MapQueryService>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(service: Arc<MapQueryService>) -> Self {
        Self {
            service,
            start_time: std::time::Instant::now(),
        }
    }
}
