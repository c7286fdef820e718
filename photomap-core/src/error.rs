//! Error types for map tile operations.

use thiserror::Error;

/// Errors produced by the tile engine core.
///
/// `Malformed*` variants are client errors: they are never retried and are
/// surfaced to the caller as-is. Upstream read failures propagate unchanged;
/// retry policy, if any, belongs to the read port itself.
///
/// Note the deliberate absences: an out-of-range zoom is clamped rather than
/// rejected, and a viewport that falls entirely outside the service region
/// yields an empty result, not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("malformed bounding box '{input}': {reason}")]
    MalformedBBox { input: String, reason: String },

    #[error("malformed cluster identifier '{input}'")]
    MalformedClusterId { input: String },

    #[error("malformed cache key '{input}': {reason}")]
    MalformedCacheKey { input: String, reason: String },

    #[error("upstream read failed: {reason}")]
    UpstreamRead { reason: String },
}

impl MapError {
    pub fn malformed_bbox(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedBBox {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_cluster_id(input: impl Into<String>) -> Self {
        Self::MalformedClusterId {
            input: input.into(),
        }
    }

    pub fn malformed_cache_key(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCacheKey {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream_read(reason: impl Into<String>) -> Self {
        Self::UpstreamRead {
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by unparsable caller input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedBBox { .. }
                | Self::MalformedClusterId { .. }
                | Self::MalformedCacheKey { .. }
        )
    }
}

/// Result type for tile engine operations.
pub type MapResult<T> = Result<T, MapError>;
