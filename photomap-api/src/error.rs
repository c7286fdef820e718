//! Error Types for the PHOTOMAP API
//!
//! Defines the structured error envelope every endpoint returns:
//! - ApiError struct serialized as the JSON response body
//! - ErrorCode enum mapping categories to HTTP status codes
//! - IntoResponse implementation for Axum
//! - Conversions from the engine's MapError

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use photomap_core::MapError;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request contains invalid input data
    InvalidInput,

    /// Field format is incorrect (bbox literal, cluster id, cache key)
    InvalidFormat,

    /// Field value is out of valid range
    InvalidRange,

    /// Requested entity does not exist
    EntityNotFound,

    /// The photo read port failed
    UpstreamUnavailable,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::InvalidFormat | ErrorCode::InvalidRange => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::UpstreamUnavailable => "Photo store temporarily unavailable",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending input, field name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    /// Create an UpstreamUnavailable error.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Implement IntoResponse for ApiError to enable automatic error handling
/// in Axum handlers.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

/// Convert engine errors into the API envelope. Malformed-input variants
/// stay 400s; upstream read failures are logged in full and surfaced as
/// a generic 503 to avoid leaking store internals.
impl From<MapError> for ApiError {
    fn from(err: MapError) -> Self {
        match &err {
            MapError::MalformedBBox { input, reason } => {
                ApiError::invalid_format("bbox", "west,south,east,north in degrees")
                    .with_details(serde_json::json!({ "input": input, "reason": reason }))
            }
            MapError::MalformedClusterId { input } => {
                ApiError::invalid_format("clusterId", "z{zoom}_{cellX}_{cellY}")
                    .with_details(serde_json::json!({ "input": input }))
            }
            MapError::MalformedCacheKey { .. } => {
                tracing::error!(error = %err, "cache key corruption");
                ApiError::internal_error("Cache key corruption")
            }
            MapError::UpstreamRead { .. } => {
                tracing::error!(error = %err, "read port failure");
                ApiError::upstream_unavailable("Photo store temporarily unavailable")
            }
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
