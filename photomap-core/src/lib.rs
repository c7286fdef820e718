//! PHOTOMAP Core - Geospatial Value Types
//!
//! Pure data structures and pure functions shared by the whole workspace:
//! the zoom grid model, viewport handling, the cluster identifier codec,
//! read models, album bounds, and the error taxonomy. No I/O, no async.

pub mod bbox;
pub mod cluster_id;
pub mod error;
pub mod grid;
pub mod model;

pub use bbox::{BBox, HORIZONTAL_SPAN_FACTOR, VERTICAL_SPAN_FACTOR};
pub use cluster_id::ClusterId;
pub use error::{MapError, MapResult};
pub use grid::{
    clamp_zoom, grid_size, grid_size_meters, GridCell, GridSpec, BASE_GRID_DEG, MAX_ZOOM,
    METERS_PER_DEG, MIN_ZOOM,
};
pub use model::{AlbumBounds, ClusterCandidate, ClusterReadModel, Page, PhotoProjection};
