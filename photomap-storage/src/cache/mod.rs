pub mod backend;
pub mod key;
pub mod tile_cache;
pub mod version;

pub use backend::{InMemoryTileCache, TileCacheBackend, TileValue};
pub use key::{build_cell_key, build_viewport_key, parse_cell_key, parse_viewport_key, CellKey, ViewportKey};
pub use tile_cache::{CacheStats, TileCache};
pub use version::{Scope, ScopeVersions};
