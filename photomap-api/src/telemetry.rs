//! Telemetry Initialization
//!
//! Sets up the tracing subscriber for structured logs. Filtering is
//! controlled by `PHOTOMAP_LOG` (falling back to `RUST_LOG`), with a
//! development default that keeps the engine crates at debug.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line.
    pub service_name: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("PHOTOMAP_SERVICE_NAME")
                .unwrap_or_else(|_| "photomap-api".to_string()),
            json_logs: std::env::var("PHOTOMAP_JSON_LOGS")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at startup before any tracing occurs. Safe to call again in
/// tests; the second initialization is ignored.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = std::env::var("PHOTOMAP_LOG")
        .map(EnvFilter::new)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| {
            EnvFilter::new("photomap_api=debug,photomap_storage=debug,tower_http=debug,info")
        });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_ok() {
        tracing::info!(service = %config.service_name, "telemetry initialized");
    }
}
