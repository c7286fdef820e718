//! Incremental album bounds tracking.
//!
//! Runs on the photo write path: every create or relocate event expands
//! the album's bounding box in O(1). Events may arrive duplicated or
//! out of order; expansion is idempotent, so delivery guarantees stay
//! loose. A relocate can only grow the box here; shrinking requires a
//! full recompute from the album's current photo set.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use photomap_core::AlbumBounds;

/// Geo event emitted by the photo write path after commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoGeoEvent {
    pub album_id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub kind: PhotoGeoEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoGeoEventKind {
    Added,
    Relocated,
}

/// Concurrent per-album bounds store. Entries are created lazily on the
/// first geotagged photo and updated under the map's per-key entry lock,
/// so concurrent expansions of the same album serialize without a
/// tracker-wide lock.
#[derive(Debug, Default)]
pub struct AlbumBoundsTracker {
    bounds: DashMap<i64, AlbumBounds>,
}

impl AlbumBoundsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands (or lazily creates) the album's bounds to cover the
    /// point. Returns whether the box changed.
    pub fn on_photo_added(&self, album_id: i64, lon: f64, lat: f64) -> bool {
        match self.bounds.entry(album_id) {
            Entry::Vacant(slot) => {
                slot.insert(AlbumBounds::at_point(album_id, lon, lat));
                debug!(%album_id, lon, lat, "album bounds created");
                true
            }
            Entry::Occupied(mut slot) => {
                let changed = slot.get_mut().expand(lon, lat);
                if changed {
                    debug!(%album_id, lon, lat, "album bounds expanded");
                }
                changed
            }
        }
    }

    /// A moved photo expands the box toward its new location. The old
    /// location is forgotten only by [`AlbumBoundsTracker::recompute`].
    pub fn on_photo_relocated(&self, album_id: i64, lon: f64, lat: f64) -> bool {
        self.on_photo_added(album_id, lon, lat)
    }

    pub fn apply(&self, event: PhotoGeoEvent) -> bool {
        match event.kind {
            PhotoGeoEventKind::Added => {
                self.on_photo_added(event.album_id, event.longitude, event.latitude)
            }
            PhotoGeoEventKind::Relocated => {
                self.on_photo_relocated(event.album_id, event.longitude, event.latitude)
            }
        }
    }

    /// Re-derives the bounds from the album's full point set. An empty
    /// set removes the entry.
    pub fn recompute(&self, album_id: i64, points: impl IntoIterator<Item = (f64, f64)>) {
        match AlbumBounds::recompute(album_id, points) {
            Some(fresh) => {
                self.bounds.insert(album_id, fresh);
            }
            None => {
                self.bounds.remove(&album_id);
            }
        }
    }

    pub fn get(&self, album_id: i64) -> Option<AlbumBounds> {
        self.bounds.get(&album_id).map(|entry| *entry)
    }
}
