//! Request and response types for the map tile API.

use serde::{Deserialize, Serialize};

use photomap_core::{AlbumBounds, BBox, ClusterReadModel, Page, PhotoProjection};
use photomap_storage::ScopeFilters;

/// Query parameters for `GET /api/v1/map/tiles`.
///
/// The viewport is given either as a `bbox` literal
/// (`west,south,east,north`) or as a `lon`/`lat` center point that the
/// engine expands to a zoom-sized viewport. `bbox` wins when both are
/// present.
#[derive(Debug, Clone, Deserialize)]
pub struct TileQuery {
    pub zoom: i64,
    pub bbox: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    #[serde(rename = "collectionId")]
    pub collection_id: Option<i64>,
    #[serde(rename = "albumId")]
    pub album_id: Option<i64>,
}

impl TileQuery {
    pub fn filters(&self) -> ScopeFilters {
        ScopeFilters {
            collection_id: self.collection_id,
            album_id: self.album_id,
        }
    }
}

/// Whether a tile carries merged clusters or individual photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileMode {
    Clustered,
    Individual,
}

/// Response body for `GET /api/v1/map/tiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileResponse {
    pub mode: TileMode,
    pub zoom: u8,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub clusters: Vec<ClusterReadModel>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photos: Vec<PhotoProjection>,
}

impl TileResponse {
    pub fn clustered(zoom: u8, clusters: Vec<ClusterReadModel>) -> Self {
        Self {
            mode: TileMode::Clustered,
            zoom,
            clusters,
            photos: Vec::new(),
        }
    }

    pub fn individual(zoom: u8, photos: Vec<PhotoProjection>) -> Self {
        Self {
            mode: TileMode::Individual,
            zoom,
            clusters: Vec::new(),
            photos,
        }
    }
}

/// Query parameters for `GET /api/v1/map/clusters/{id}/photos`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterPhotosQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    #[serde(rename = "collectionId")]
    pub collection_id: Option<i64>,
    #[serde(rename = "albumId")]
    pub album_id: Option<i64>,
}

fn default_page_size() -> u32 {
    20
}

impl ClusterPhotosQuery {
    pub fn filters(&self) -> ScopeFilters {
        ScopeFilters {
            collection_id: self.collection_id,
            album_id: self.album_id,
        }
    }
}

/// Response body for `GET /api/v1/map/clusters/{id}/photos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPhotosResponse {
    pub cluster_id: String,
    #[serde(flatten)]
    pub photos: Page<PhotoProjection>,
}

/// Response body for `GET /api/v1/map/albums/{id}/overview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumOverviewResponse {
    pub album_id: i64,
    /// Viewport literal covering the album's photos, or the service
    /// region when the album has none.
    pub bbox: String,
    pub center_lon: f64,
    pub center_lat: f64,
    pub has_photos: bool,
}

impl AlbumOverviewResponse {
    pub fn from_bounds(bounds: &AlbumBounds) -> Self {
        let (center_lon, center_lat) = bounds.center();
        Self {
            album_id: bounds.album_id,
            bbox: bounds.bbox().to_string(),
            center_lon,
            center_lat,
            has_photos: true,
        }
    }

    pub fn fallback(album_id: i64, region: &BBox) -> Self {
        let (center_lon, center_lat) = region.center();
        Self {
            album_id,
            bbox: region.to_string(),
            center_lon,
            center_lat,
            has_photos: false,
        }
    }
}

/// Request body for `POST /api/v1/map/albums/{id}/photos`, sent by the
/// photo write path after commit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoGeoEventRequest {
    pub longitude: f64,
    pub latitude: f64,
    /// True when the photo moved rather than being created.
    #[serde(default)]
    pub relocated: bool,
    /// Collection whose cached tiles the photo also affects.
    pub collection_id: Option<i64>,
}

/// Response body for the photo geo event endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoGeoEventResponse {
    pub album_id: i64,
    pub bounds_changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_response_omits_empty_collections() {
        let response = TileResponse::clustered(11, Vec::new());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["mode"], "clustered");
        assert!(json.get("photos").is_none());
        assert!(json.get("clusters").is_none());
    }

    #[test]
    fn geo_event_defaults_to_created() {
        let request: PhotoGeoEventRequest =
            serde_json::from_str(r#"{"longitude":127.0,"latitude":37.5}"#).unwrap();
        assert!(!request.relocated);
        assert_eq!(request.collection_id, None);
    }
}
