//! Read port over the photo store.
//!
//! The tile engine never talks to a database directly; it fetches raw
//! candidates and photo projections through this narrow port. Callers pass
//! the margin-expanded bounding box, and implementations are expected to
//! return rows intersecting it. Failures surface as
//! [`MapError::UpstreamRead`] and propagate unchanged; retry policy belongs
//! to the implementation, not to this core.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use photomap_core::{
    BBox, ClusterCandidate, ClusterId, GridCell, GridSpec, MapError, MapResult, Page,
    PhotoProjection,
};

/// Optional scope narrowing for map queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeFilters {
    pub collection_id: Option<i64>,
    pub album_id: Option<i64>,
}

impl ScopeFilters {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_collection(collection_id: i64) -> Self {
        Self {
            collection_id: Some(collection_id),
            album_id: None,
        }
    }

    pub fn for_album(album_id: i64) -> Self {
        Self {
            collection_id: None,
            album_id: Some(album_id),
        }
    }

    /// Cache keys normalize absent scope ids to 0.
    pub fn collection_or_zero(&self) -> i64 {
        self.collection_id.unwrap_or(0)
    }

    pub fn album_or_zero(&self) -> i64 {
        self.album_id.unwrap_or(0)
    }
}

/// Async port for raw map reads.
#[async_trait]
pub trait MapReadPort: Send + Sync {
    /// Per-cell aggregates for every grid cell intersecting `bbox`.
    async fn find_candidates_within(
        &self,
        bbox: &BBox,
        grid: &GridSpec,
        filters: &ScopeFilters,
    ) -> MapResult<Vec<ClusterCandidate>>;

    /// Individual photo projections within `bbox`.
    async fn find_photos_within(
        &self,
        bbox: &BBox,
        filters: &ScopeFilters,
    ) -> MapResult<Vec<PhotoProjection>>;

    /// One page of photos within `bbox`, newest first.
    async fn find_photos_in_cell(
        &self,
        bbox: &BBox,
        page: u32,
        size: u32,
    ) -> MapResult<Page<PhotoProjection>>;
}

/// A photo with its scope attribution, as held by the in-memory port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPhoto {
    pub projection: PhotoProjection,
    pub collection_id: Option<i64>,
    pub album_id: Option<i64>,
}

impl StoredPhoto {
    fn matches(&self, filters: &ScopeFilters) -> bool {
        if let Some(collection_id) = filters.collection_id {
            if self.collection_id != Some(collection_id) {
                return false;
            }
        }
        if let Some(album_id) = filters.album_id {
            if self.album_id != Some(album_id) {
                return false;
            }
        }
        true
    }
}

/// In-memory read port: holds photos and performs the cell aggregation
/// itself. Serves tests and the development binary; a production
/// deployment implements [`MapReadPort`] over its own photo store.
#[derive(Debug, Default)]
pub struct InMemoryReadPort {
    photos: RwLock<Vec<StoredPhoto>>,
    candidate_calls: AtomicUsize,
    photo_calls: AtomicUsize,
}

impl InMemoryReadPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_photos(photos: Vec<StoredPhoto>) -> Self {
        Self {
            photos: RwLock::new(photos),
            ..Self::default()
        }
    }

    pub fn insert(&self, photo: StoredPhoto) {
        self.photos
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(photo);
    }

    /// How many candidate aggregations ran; used to observe cache hits.
    pub fn candidate_calls(&self) -> usize {
        self.candidate_calls.load(Ordering::Relaxed)
    }

    pub fn photo_calls(&self) -> usize {
        self.photo_calls.load(Ordering::Relaxed)
    }

    fn snapshot(&self, bbox: &BBox, filters: &ScopeFilters) -> Vec<StoredPhoto> {
        self.photos
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|photo| {
                photo.matches(filters)
                    && bbox.contains(photo.projection.longitude, photo.projection.latitude)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MapReadPort for InMemoryReadPort {
    async fn find_candidates_within(
        &self,
        bbox: &BBox,
        grid: &GridSpec,
        filters: &ScopeFilters,
    ) -> MapResult<Vec<ClusterCandidate>> {
        self.candidate_calls.fetch_add(1, Ordering::Relaxed);

        // BTreeMap keeps the aggregation output in (cell_y, cell_x) order.
        let mut cells: BTreeMap<(i64, i64), Vec<PhotoProjection>> = BTreeMap::new();
        for photo in self.snapshot(bbox, filters) {
            let cell = GridCell::containing(
                grid.zoom,
                photo.projection.longitude,
                photo.projection.latitude,
            );
            cells
                .entry((cell.cell_y, cell.cell_x))
                .or_default()
                .push(photo.projection);
        }

        let candidates = cells
            .into_iter()
            .map(|((cell_y, cell_x), photos)| {
                let count = photos.len() as u64;
                let lon = photos.iter().map(|p| p.longitude).sum::<f64>() / count as f64;
                let lat = photos.iter().map(|p| p.latitude).sum::<f64>() / count as f64;
                let newest = photos
                    .iter()
                    .max_by_key(|p| (p.taken_at, p.photo_id))
                    .expect("cell has at least one photo");
                ClusterCandidate {
                    id: ClusterId::new(GridCell::new(grid.zoom, cell_x, cell_y)).encode(),
                    count,
                    center_lon: lon,
                    center_lat: lat,
                    thumbnail_url: newest.thumbnail_url.clone(),
                    taken_at: newest.taken_at,
                }
            })
            .collect();
        Ok(candidates)
    }

    async fn find_photos_within(
        &self,
        bbox: &BBox,
        filters: &ScopeFilters,
    ) -> MapResult<Vec<PhotoProjection>> {
        self.photo_calls.fetch_add(1, Ordering::Relaxed);
        let mut photos: Vec<PhotoProjection> = self
            .snapshot(bbox, filters)
            .into_iter()
            .map(|p| p.projection)
            .collect();
        photos.sort_by(|a, b| b.taken_at.cmp(&a.taken_at).then(a.photo_id.cmp(&b.photo_id)));
        Ok(photos)
    }

    async fn find_photos_in_cell(
        &self,
        bbox: &BBox,
        page: u32,
        size: u32,
    ) -> MapResult<Page<PhotoProjection>> {
        if size == 0 {
            return Err(MapError::upstream_read("page size must be positive"));
        }
        let photos = self.find_photos_within(bbox, &ScopeFilters::none()).await?;
        let total = photos.len() as u64;
        let start = page as usize * size as usize;
        let items = photos.into_iter().skip(start).take(size as usize).collect();
        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }
}
