//! Map Query Orchestrator
//!
//! Composes the grid model, merge strategy, read port, tile cache, and
//! album bounds tracker behind the handful of operations the routes
//! expose. The orchestrator decides clustered versus individual mode by
//! zoom, serves tiles cache-first, and translates photo write events
//! into bounds expansion plus cache invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use photomap_cluster::{strategy_for, MergeStrategy};
use photomap_core::{
    grid_size, BBox, ClusterCandidate, ClusterId, GridCell, GridSpec,
};
use photomap_storage::{
    AlbumBoundsTracker, CacheStats, InMemoryTileCache, MapReadPort, PhotoGeoEvent,
    PhotoGeoEventKind, Scope, ScopeFilters, TileCache, TileValue,
};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::types::{
    AlbumOverviewResponse, ClusterPhotosResponse, PhotoGeoEventRequest, PhotoGeoEventResponse,
    TileResponse,
};

/// Bounding box of a single grid cell.
fn cell_bbox(cell: GridCell) -> BBox {
    let (west, south) = cell.origin();
    let step = grid_size(cell.zoom);
    BBox {
        west,
        south,
        east: west + step,
        north: south + step,
    }
}

/// The map engine behind the HTTP surface.
pub struct MapQueryService {
    read_port: Arc<dyn MapReadPort>,
    cache: TileCache,
    strategy: Arc<dyn MergeStrategy>,
    bounds: Arc<AlbumBoundsTracker>,
    config: ApiConfig,
}

impl MapQueryService {
    pub fn new(read_port: Arc<dyn MapReadPort>, config: ApiConfig) -> Self {
        let backend = Arc::new(InMemoryTileCache::new(config.cache_capacity));
        Self {
            read_port,
            cache: TileCache::new(backend),
            strategy: strategy_for(config.merge_strategy),
            bounds: Arc::new(AlbumBoundsTracker::new()),
            config,
        }
    }

    /// Serve one tile. Below the configured zoom threshold the viewport
    /// is snapped to the grid, expanded by a half-cell margin, and served
    /// as merged clusters; at or above it the photos come back
    /// individually.
    #[instrument(skip(self, filters), fields(strategy = %self.strategy.kind().as_str()))]
    pub async fn tile(
        &self,
        zoom: u8,
        viewport: BBox,
        filters: &ScopeFilters,
    ) -> ApiResult<TileResponse> {
        if zoom < self.config.cluster_zoom_threshold {
            self.clustered_tile(zoom, viewport, filters).await
        } else {
            self.individual_tile(zoom, viewport, filters).await
        }
    }

    async fn clustered_tile(
        &self,
        zoom: u8,
        viewport: BBox,
        filters: &ScopeFilters,
    ) -> ApiResult<TileResponse> {
        let Some(clipped) = viewport.clamp_to_region(&self.config.service_region) else {
            return Ok(TileResponse::clustered(zoom, Vec::new()));
        };
        let expanded = clipped.snap_to_grid(zoom).expand_by_margin(zoom);
        let grid = GridSpec::at(zoom);

        // Absurdly wide viewports are served directly; caching that many
        // cells would evict everything useful.
        if expanded.cell_count(zoom) > self.config.max_cached_cells {
            debug!(zoom, "viewport exceeds cached cell budget, serving uncached");
            let candidates = self
                .read_port
                .find_candidates_within(&expanded, &grid, filters)
                .await?;
            return Ok(TileResponse::clustered(
                zoom,
                self.strategy.merge(candidates, zoom),
            ));
        }

        let cells = expanded.grid_cells(zoom);
        let candidates = match self.probe_cells(&cells, filters).await? {
            Some(cached) => cached,
            None => {
                let fetched = self
                    .read_port
                    .find_candidates_within(&expanded, &grid, filters)
                    .await?;
                self.populate_cells(&cells, &fetched, filters).await?;
                fetched
            }
        };

        Ok(TileResponse::clustered(
            zoom,
            self.strategy.merge(candidates, zoom),
        ))
    }

    /// Collect candidates for every cell from the cache, or `None` on
    /// the first miss. Partial hits are treated as a miss of the whole
    /// viewport; one aggregated fetch repopulates every cell.
    async fn probe_cells(
        &self,
        cells: &[GridCell],
        filters: &ScopeFilters,
    ) -> ApiResult<Option<Vec<ClusterCandidate>>> {
        let mut collected = Vec::new();
        for cell in cells {
            let key = self.cache.cell_key(*cell, filters);
            match self.cache.get(&key).await? {
                Some(TileValue::Candidates(items)) => collected.extend(items),
                _ => return Ok(None),
            }
        }
        Ok(Some(collected))
    }

    /// Store fetched candidates per cell. Cells without candidates get
    /// an empty entry so known-empty ocean does not re-query the store.
    async fn populate_cells(
        &self,
        cells: &[GridCell],
        fetched: &[ClusterCandidate],
        filters: &ScopeFilters,
    ) -> ApiResult<()> {
        let mut per_cell: HashMap<GridCell, Vec<ClusterCandidate>> =
            cells.iter().map(|cell| (*cell, Vec::new())).collect();
        for candidate in fetched {
            // Candidates with unparsable ids or outside the window are
            // served but never cached.
            if let Some(items) = candidate.cell().and_then(|cell| per_cell.get_mut(&cell)) {
                items.push(candidate.clone());
            }
        }
        for (cell, items) in per_cell {
            let key = self.cache.cell_key(cell, filters);
            self.cache.put(key, TileValue::Candidates(items)).await?;
        }
        Ok(())
    }

    async fn individual_tile(
        &self,
        zoom: u8,
        viewport: BBox,
        filters: &ScopeFilters,
    ) -> ApiResult<TileResponse> {
        let Some(clipped) = viewport.clamp_to_region(&self.config.service_region) else {
            return Ok(TileResponse::individual(zoom, Vec::new()));
        };

        let key = self.cache.viewport_key(zoom, &clipped, filters);
        if let Some(TileValue::Photos(photos)) = self.cache.get(&key).await? {
            return Ok(TileResponse::individual(zoom, photos));
        }

        let photos = self
            .read_port
            .find_photos_within(&clipped.expand_by_margin(zoom), filters)
            .await?;
        self.cache
            .put(key, TileValue::Photos(photos.clone()))
            .await?;
        Ok(TileResponse::individual(zoom, photos))
    }

    /// One page of the photos behind a displayed cluster, newest first.
    ///
    /// The cluster id names a representative cell; membership is
    /// re-resolved against the current candidates of its neighborhood so
    /// pagination sees the same grouping the tile response showed.
    pub async fn cluster_photos(
        &self,
        raw_id: &str,
        filters: &ScopeFilters,
        page: u32,
        size: u32,
    ) -> ApiResult<ClusterPhotosResponse> {
        let cluster_id = ClusterId::decode(raw_id)?;
        let size = size.clamp(1, self.config.page_size_max);
        let target = cluster_id.cell;
        let zoom = target.zoom;

        let step = grid_size(zoom);
        let target_bbox = cell_bbox(target);
        let neighborhood = BBox {
            west: target_bbox.west - step,
            south: (target_bbox.south - step).max(-90.0),
            east: target_bbox.east + step,
            north: (target_bbox.north + step).min(90.0),
        };
        let grid = GridSpec::at(zoom);
        let candidates = self
            .read_port
            .find_candidates_within(&neighborhood, &grid, filters)
            .await?;
        let members = self.strategy.resolve_membership(zoom, &candidates, &target);

        let mut union = target_bbox;
        for member in &members {
            let member_bbox = cell_bbox(*member);
            union.west = union.west.min(member_bbox.west);
            union.south = union.south.min(member_bbox.south);
            union.east = union.east.max(member_bbox.east);
            union.north = union.north.max(member_bbox.north);
        }

        let photos = self.read_port.find_photos_in_cell(&union, page, size).await?;
        Ok(ClusterPhotosResponse {
            cluster_id: raw_id.to_string(),
            photos,
        })
    }

    /// Bounding box and center of an album's photos; falls back to the
    /// service region for albums with no geotagged photos yet.
    pub fn album_overview(&self, album_id: i64) -> AlbumOverviewResponse {
        match self.bounds.get(album_id) {
            Some(bounds) => AlbumOverviewResponse::from_bounds(&bounds),
            None => AlbumOverviewResponse::fallback(album_id, &self.config.service_region),
        }
    }

    /// Apply one photo geo event: expand the album's bounds and bump the
    /// versions of every scope the photo's tiles may appear under.
    pub fn record_photo_event(
        &self,
        album_id: i64,
        request: &PhotoGeoEventRequest,
    ) -> PhotoGeoEventResponse {
        let kind = if request.relocated {
            PhotoGeoEventKind::Relocated
        } else {
            PhotoGeoEventKind::Added
        };
        let bounds_changed = self.bounds.apply(PhotoGeoEvent {
            album_id,
            longitude: request.longitude,
            latitude: request.latitude,
            kind,
        });

        self.cache.invalidate(Scope::Global);
        self.cache.invalidate(Scope::Album(album_id));
        if let Some(collection_id) = request.collection_id {
            self.cache.invalidate(Scope::Collection(collection_id));
        }

        PhotoGeoEventResponse {
            album_id,
            bounds_changed,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileMode;
    use photomap_test_utils::{stored_photo_at, InMemoryReadPort};

    fn service_with(photos: Vec<photomap_storage::StoredPhoto>, config: ApiConfig) -> (Arc<InMemoryReadPort>, MapQueryService) {
        let port = Arc::new(InMemoryReadPort::with_photos(photos));
        let service = MapQueryService::new(port.clone(), config);
        (port, service)
    }

    fn seoul_viewport() -> BBox {
        BBox::new(126.8, 37.3, 127.2, 37.7).unwrap()
    }

    #[tokio::test]
    async fn repeated_tile_queries_hit_the_cache() {
        let (port, service) = service_with(
            vec![
                stored_photo_at(126.97, 37.56, 1, None, None),
                stored_photo_at(126.98, 37.57, 2, None, None),
            ],
            ApiConfig::default(),
        );
        let filters = ScopeFilters::none();

        let first = service.tile(11, seoul_viewport(), &filters).await.unwrap();
        assert_eq!(first.mode, TileMode::Clustered);
        assert_eq!(port.candidate_calls(), 1);

        let second = service.tile(11, seoul_viewport(), &filters).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(port.candidate_calls(), 1);
        assert!(service.cache_stats().hits > 0);
    }

    #[tokio::test]
    async fn photo_event_invalidates_cached_tiles() {
        let (port, service) = service_with(
            vec![stored_photo_at(126.97, 37.56, 1, None, Some(5))],
            ApiConfig::default(),
        );
        let filters = ScopeFilters::none();

        service.tile(11, seoul_viewport(), &filters).await.unwrap();
        service.tile(11, seoul_viewport(), &filters).await.unwrap();
        assert_eq!(port.candidate_calls(), 1);

        port.insert(stored_photo_at(126.99, 37.58, 2, None, Some(5)));
        let event = service.record_photo_event(
            5,
            &PhotoGeoEventRequest {
                longitude: 126.99,
                latitude: 37.58,
                relocated: false,
                collection_id: None,
            },
        );
        // First geotagged photo for the album creates the bounds box.
        assert!(event.bounds_changed);

        let refreshed = service.tile(11, seoul_viewport(), &filters).await.unwrap();
        assert_eq!(port.candidate_calls(), 2);
        let total: u64 = refreshed.clusters.iter().map(|c| c.count).sum();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn viewport_outside_service_region_is_empty_without_fetch() {
        let config = ApiConfig {
            service_region: BBox::new(124.0, 33.0, 132.0, 39.0).unwrap(),
            ..ApiConfig::default()
        };
        let (port, service) = service_with(vec![stored_photo_at(126.97, 37.56, 1, None, None)], config);

        let atlantic = BBox::new(-40.0, 20.0, -30.0, 30.0).unwrap();
        let tile = service.tile(11, atlantic, &ScopeFilters::none()).await.unwrap();
        assert!(tile.clusters.is_empty());
        assert_eq!(port.candidate_calls(), 0);
    }

    #[tokio::test]
    async fn high_zoom_serves_individual_photos() {
        let (port, service) = service_with(
            vec![
                stored_photo_at(126.97, 37.56, 1, None, None),
                stored_photo_at(126.9701, 37.5601, 2, None, None),
            ],
            ApiConfig::default(),
        );
        let filters = ScopeFilters::none();
        let viewport = BBox::new(126.96, 37.55, 126.98, 37.57).unwrap();

        let tile = service.tile(17, viewport, &filters).await.unwrap();
        assert_eq!(tile.mode, TileMode::Individual);
        assert_eq!(tile.photos.len(), 2);
        assert_eq!(port.photo_calls(), 1);

        // Same viewport again is a cache hit.
        service.tile(17, viewport, &filters).await.unwrap();
        assert_eq!(port.photo_calls(), 1);
    }

    #[tokio::test]
    async fn scoped_queries_do_not_share_cache_entries() {
        let (port, service) = service_with(
            vec![
                stored_photo_at(126.97, 37.56, 1, None, Some(5)),
                stored_photo_at(126.98, 37.57, 2, None, Some(6)),
            ],
            ApiConfig::default(),
        );

        let album5 = service
            .tile(11, seoul_viewport(), &ScopeFilters::for_album(5))
            .await
            .unwrap();
        let album6 = service
            .tile(11, seoul_viewport(), &ScopeFilters::for_album(6))
            .await
            .unwrap();
        assert_eq!(port.candidate_calls(), 2);
        assert_ne!(album5, album6);
    }

    #[tokio::test]
    async fn cluster_photos_rejects_malformed_ids() {
        let (_, service) = service_with(Vec::new(), ApiConfig::default());
        let err = service
            .cluster_photos("invalid", &ScopeFilters::none(), 0, 20)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn cluster_photos_pages_member_photos() {
        let (_, service) = service_with(
            vec![
                stored_photo_at(126.97, 37.56, 1, None, None),
                stored_photo_at(126.975, 37.565, 2, None, None),
                stored_photo_at(126.98, 37.57, 3, None, None),
            ],
            ApiConfig::default(),
        );
        let cell = GridCell::containing(11, 126.97, 37.56);
        let id = ClusterId::new(cell).encode();

        let page = service
            .cluster_photos(&id, &ScopeFilters::none(), 0, 2)
            .await
            .unwrap();
        assert_eq!(page.photos.items.len(), 2);
        assert!(page.photos.total >= 2);
        assert_eq!(page.cluster_id, id);
    }

    #[tokio::test]
    async fn album_overview_falls_back_to_service_region() {
        let (_, service) = service_with(Vec::new(), ApiConfig::default());

        let empty = service.album_overview(9);
        assert!(!empty.has_photos);

        service.record_photo_event(
            9,
            &PhotoGeoEventRequest {
                longitude: 127.0,
                latitude: 37.5,
                relocated: false,
                collection_id: None,
            },
        );
        let populated = service.album_overview(9);
        assert!(populated.has_photos);
        assert_eq!(populated.center_lon, 127.0);
        assert_eq!(populated.center_lat, 37.5);
    }
}
