//! Read models and per-album bounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bbox::BBox;
use crate::cluster_id::ClusterId;
use crate::grid::GridCell;

/// Raw per-cell aggregate produced by the read port, before cross-cell
/// merging. `id` is the encoded cell token emitted by the aggregation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCandidate {
    pub id: String,
    pub count: u64,
    pub center_lon: f64,
    pub center_lat: f64,
    pub thumbnail_url: String,
    pub taken_at: DateTime<Utc>,
}

impl ClusterCandidate {
    /// The grid cell this candidate aggregates, if its id parses.
    ///
    /// Candidates with unparsable ids are never dropped; merge strategies
    /// pass them through untouched so no photo disappears from a response.
    pub fn cell(&self) -> Option<GridCell> {
        ClusterId::decode(&self.id).ok().map(|id| id.cell)
    }
}

/// Post-merge cluster as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReadModel {
    pub cluster_id: String,
    pub count: u64,
    pub thumbnail_url: String,
    pub longitude: f64,
    pub latitude: f64,
    pub taken_at: DateTime<Utc>,
}

impl From<ClusterCandidate> for ClusterReadModel {
    fn from(candidate: ClusterCandidate) -> Self {
        Self {
            cluster_id: candidate.id,
            count: candidate.count,
            thumbnail_url: candidate.thumbnail_url,
            longitude: candidate.center_lon,
            latitude: candidate.center_lat,
            taken_at: candidate.taken_at,
        }
    }
}

/// Individual photo marker, served above the clustering zoom threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoProjection {
    pub photo_id: Uuid,
    pub longitude: f64,
    pub latitude: f64,
    pub thumbnail_url: String,
    pub taken_at: DateTime<Utc>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty(page: u32, size: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            size,
            total: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

/// Running min/max longitude/latitude of one album's photos.
///
/// Mutated only by monotonic expansion (min only decreases, max only
/// increases) or by full recomputation from a photo set. Created lazily on
/// the first geotagged photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlbumBounds {
    pub album_id: i64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl AlbumBounds {
    /// Degenerate box at a single point.
    pub fn at_point(album_id: i64, lon: f64, lat: f64) -> Self {
        Self {
            album_id,
            min_lon: lon,
            max_lon: lon,
            min_lat: lat,
            max_lat: lat,
        }
    }

    /// Monotonic O(1) expansion. Returns whether anything changed; expanding
    /// with an interior or duplicate point is a no-op, which makes duplicate
    /// and out-of-order event delivery safe.
    pub fn expand(&mut self, lon: f64, lat: f64) -> bool {
        let mut changed = false;
        if lon < self.min_lon {
            self.min_lon = lon;
            changed = true;
        }
        if lon > self.max_lon {
            self.max_lon = lon;
            changed = true;
        }
        if lat < self.min_lat {
            self.min_lat = lat;
            changed = true;
        }
        if lat > self.max_lat {
            self.max_lat = lat;
            changed = true;
        }
        changed
    }

    /// Full re-derivation from a photo set; the only way bounds may shrink.
    /// Returns `None` for an empty set.
    pub fn recompute(album_id: i64, points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let mut bounds = Self::at_point(album_id, lon, lat);
        for (lon, lat) in iter {
            bounds.expand(lon, lat);
        }
        Some(bounds)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Bounding box of the album. A degenerate (single-point) box is padded
    /// by a hair so the `west < east` invariant holds.
    pub fn bbox(&self) -> BBox {
        const EPS: f64 = 1e-9;
        BBox {
            west: self.min_lon,
            south: self.min_lat,
            east: if self.max_lon > self.min_lon {
                self.max_lon
            } else {
                self.max_lon + EPS
            },
            north: if self.max_lat > self.min_lat {
                self.max_lat
            } else {
                self.max_lat + EPS
            },
        }
    }
}
