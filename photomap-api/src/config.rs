//! API Configuration Module
//!
//! Runtime configuration for the map tile API, loaded from environment
//! variables with development defaults. All knobs here are read once at
//! startup; nothing re-reads the environment per request.

use std::str::FromStr;

use photomap_core::BBox;
use photomap_cluster::MergeStrategyKind;

use crate::error::{ApiError, ApiResult};

/// Zoom level at which the map switches from clustered pins to
/// individual photos.
pub const DEFAULT_CLUSTER_ZOOM_THRESHOLD: u8 = 16;

/// Default tile cache capacity, in entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Default upper bound on the page size for cluster photo listings.
pub const DEFAULT_PAGE_SIZE_MAX: u32 = 100;

/// Viewports covering more grid cells than this bypass the per-cell
/// cache and are served with a single uncached fetch.
pub const DEFAULT_MAX_CACHED_CELLS: u64 = 4096;

/// Map engine configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Queries below this zoom return clusters; at or above, photos.
    pub cluster_zoom_threshold: u8,

    /// Which boundary merge strategy to run.
    pub merge_strategy: MergeStrategyKind,

    /// Tile cache capacity in entries.
    pub cache_capacity: usize,

    /// Region the service clamps every viewport to. Defaults to the
    /// whole world.
    pub service_region: BBox,

    /// Hard cap on the photo listing page size.
    pub page_size_max: u32,

    /// Cell count above which a viewport is served without caching.
    pub max_cached_cells: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cluster_zoom_threshold: DEFAULT_CLUSTER_ZOOM_THRESHOLD,
            merge_strategy: MergeStrategyKind::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            service_region: BBox::world(),
            page_size_max: DEFAULT_PAGE_SIZE_MAX,
            max_cached_cells: DEFAULT_MAX_CACHED_CELLS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PHOTOMAP_CLUSTER_ZOOM_THRESHOLD`: Mode switch zoom (default: 16)
    /// - `PHOTOMAP_MERGE_STRATEGY`: "legacy", "distance", or "pixel" (default: distance)
    /// - `PHOTOMAP_CACHE_CAPACITY`: Tile cache entries (default: 4096)
    /// - `PHOTOMAP_SERVICE_REGION`: "west,south,east,north" clamp region (default: world)
    /// - `PHOTOMAP_PAGE_SIZE_MAX`: Photo listing page cap (default: 100)
    /// - `PHOTOMAP_MAX_CACHED_CELLS`: Cache bypass threshold (default: 4096)
    ///
    /// Unknown strategy names and unparsable regions are startup errors,
    /// never silent fallbacks.
    pub fn from_env() -> ApiResult<Self> {
        let cluster_zoom_threshold = std::env::var("PHOTOMAP_CLUSTER_ZOOM_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CLUSTER_ZOOM_THRESHOLD);

        let merge_strategy = match std::env::var("PHOTOMAP_MERGE_STRATEGY") {
            Ok(name) => MergeStrategyKind::from_str(&name)
                .map_err(|e| ApiError::invalid_input(e.to_string()))?,
            Err(_) => MergeStrategyKind::default(),
        };

        let cache_capacity = std::env::var("PHOTOMAP_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        let service_region = match std::env::var("PHOTOMAP_SERVICE_REGION") {
            Ok(literal) => literal.parse::<BBox>().map_err(ApiError::from)?,
            Err(_) => BBox::world(),
        };

        let page_size_max = std::env::var("PHOTOMAP_PAGE_SIZE_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE_MAX);

        let max_cached_cells = std::env::var("PHOTOMAP_MAX_CACHED_CELLS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CACHED_CELLS);

        Ok(Self {
            cluster_zoom_threshold,
            merge_strategy,
            cache_capacity,
            service_region,
            page_size_max,
            max_cached_cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_world() {
        let config = ApiConfig::default();
        assert_eq!(config.cluster_zoom_threshold, 16);
        assert_eq!(config.merge_strategy, MergeStrategyKind::Distance);
        assert_eq!(config.service_region, BBox::world());
    }
}
