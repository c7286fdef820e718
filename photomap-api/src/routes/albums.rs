//! Album Map Routes
//!
//! - GET /api/v1/map/albums/{id}/overview returns the album's bounding
//!   box and center for the initial map view.
//! - POST /api/v1/map/albums/{id}/photos is the write-path hook: the
//!   photo service reports a created or relocated photo here after
//!   commit, which expands the album's bounds and invalidates cached
//!   tiles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::PhotoGeoEventRequest;

/// GET /api/v1/map/albums/{id}/overview - album viewport for the map.
pub async fn get_album_overview(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.album_overview(album_id)))
}

/// POST /api/v1/map/albums/{id}/photos - photo created/relocated event.
pub async fn record_photo_event(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    Json(request): Json<PhotoGeoEventRequest>,
) -> ApiResult<impl IntoResponse> {
    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ApiError::invalid_range("longitude", -180.0, 180.0));
    }
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ApiError::invalid_range("latitude", -90.0, 90.0));
    }

    let response = state.service.record_photo_event(album_id, &request);
    Ok((StatusCode::ACCEPTED, Json(response)))
}
