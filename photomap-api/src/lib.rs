//! PHOTOMAP API
//!
//! HTTP surface of the photo map engine: tile queries, cluster photo
//! pagination, album overviews, and the photo geo event hook. The
//! heavy lifting (grid math, merging, caching) lives in the engine
//! crates; this crate wires them behind Axum routes.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use services::MapQueryService;
pub use state::AppState;
pub use telemetry::{init_telemetry, TelemetryConfig};
