//! Storage-facing side of the map engine: the read port abstraction
//! over the photo store, the versioned tile cache, and the album
//! bounds tracker that rides the photo write path.

pub mod bounds;
pub mod cache;
pub mod read_port;

pub use bounds::{AlbumBoundsTracker, PhotoGeoEvent, PhotoGeoEventKind};
pub use cache::{
    CacheStats, InMemoryTileCache, Scope, ScopeVersions, TileCache, TileCacheBackend, TileValue,
};
pub use read_port::{InMemoryReadPort, MapReadPort, ScopeFilters, StoredPhoto};
