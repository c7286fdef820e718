//! PHOTOMAP API Server Entry Point
//!
//! Bootstraps configuration and telemetry, builds the map engine over
//! the in-memory read port, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use photomap_api::telemetry::{init_telemetry, TelemetryConfig};
use photomap_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, MapQueryService};
use photomap_storage::InMemoryReadPort;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_telemetry(&telemetry_config);

    let api_config = ApiConfig::from_env()?;
    tracing::info!(
        strategy = api_config.merge_strategy.as_str(),
        zoom_threshold = api_config.cluster_zoom_threshold,
        "map engine configured"
    );

    // Development read port; a deployment wires its photo store here.
    let read_port = Arc::new(InMemoryReadPort::new());
    let service = Arc::new(MapQueryService::new(read_port, api_config));
    let state = AppState::new(service);

    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting PHOTOMAP API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("PHOTOMAP_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PHOTOMAP_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
