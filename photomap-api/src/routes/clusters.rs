//! Cluster Photo Listing Route
//!
//! GET /api/v1/map/clusters/{id}/photos pages through the photos behind
//! one displayed cluster. The id is the encoded cell token from a tile
//! response; membership is re-resolved so merged neighbors are included.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::ClusterPhotosQuery;

/// GET /api/v1/map/clusters/{id}/photos - paged photos of a cluster.
pub async fn get_cluster_photos(
    State(state): State<AppState>,
    Path(cluster_id): Path<String>,
    Query(query): Query<ClusterPhotosQuery>,
) -> ApiResult<impl IntoResponse> {
    let response = state
        .service
        .cluster_photos(&cluster_id, &query.filters(), query.page, query.size)
        .await?;
    Ok(Json(response))
}
