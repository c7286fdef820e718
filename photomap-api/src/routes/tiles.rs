//! Map Tile Route
//!
//! GET /api/v1/map/tiles serves one viewport worth of map content:
//! merged clusters below the zoom threshold, individual photos above it.
//! The viewport comes in as a `bbox` literal or as a center point the
//! engine expands to a zoom-sized box.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use photomap_core::{clamp_zoom, BBox};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::TileQuery;

/// GET /api/v1/map/tiles - clusters or photos for a viewport.
pub async fn get_tile(
    State(state): State<AppState>,
    Query(query): Query<TileQuery>,
) -> ApiResult<impl IntoResponse> {
    let zoom = clamp_zoom(query.zoom);

    let viewport = match (&query.bbox, query.lon, query.lat) {
        (Some(literal), _, _) => literal.parse::<BBox>().map_err(ApiError::from)?,
        (None, Some(lon), Some(lat)) => {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::invalid_range("lon", -180.0, 180.0));
            }
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ApiError::invalid_range("lat", -90.0, 90.0));
            }
            BBox::from_center(zoom, lon, lat)
        }
        _ => {
            return Err(ApiError::invalid_input(
                "either 'bbox' or both 'lon' and 'lat' are required",
            ))
        }
    };

    let tile = state.service.tile(zoom, viewport, &query.filters()).await?;
    Ok(Json(tile))
}
