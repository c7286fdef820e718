//! Versioned tile cache facade.
//!
//! Ties the key factory, scope version counters, and the storage
//! backend together. Callers never build key strings themselves; they
//! hand over the query coordinates and filters and the cache stamps the
//! current scope version in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use photomap_core::{BBox, GridCell, MapResult};

use super::backend::{TileCacheBackend, TileValue};
use super::key::{build_cell_key, build_viewport_key};
use super::version::{Scope, ScopeVersions};
use crate::read_port::ScopeFilters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct TileCache {
    backend: Arc<dyn TileCacheBackend>,
    versions: ScopeVersions,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TileCache {
    pub fn new(backend: Arc<dyn TileCacheBackend>) -> Self {
        Self {
            backend,
            versions: ScopeVersions::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Key for a single grid cell's cluster candidates, stamped with the
    /// current version of the query's scope.
    pub fn cell_key(&self, cell: GridCell, filters: &ScopeFilters) -> String {
        let version = self.versions.current(Scope::from_filters(filters));
        build_cell_key(
            cell.zoom,
            cell.cell_x,
            cell.cell_y,
            filters.collection_or_zero(),
            filters.album_or_zero(),
            version,
        )
    }

    /// Key for a viewport's individual-photo payload.
    pub fn viewport_key(&self, zoom: u8, bbox: &BBox, filters: &ScopeFilters) -> String {
        let version = self.versions.current(Scope::from_filters(filters));
        build_viewport_key(
            zoom,
            bbox,
            filters.collection_or_zero(),
            filters.album_or_zero(),
            version,
        )
    }

    pub async fn get(&self, key: &str) -> MapResult<Option<TileValue>> {
        let found = self.backend.get(key).await?;
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    pub async fn put(&self, key: String, value: TileValue) -> MapResult<()> {
        self.backend.put(key, value).await
    }

    /// Detaches every entry of the scope by bumping its version. The
    /// entries themselves stay in the backend until the LRU evicts them.
    pub fn invalidate(&self, scope: Scope) -> u64 {
        let version = self.versions.bump(scope);
        debug!(?scope, version, "tile cache scope invalidated");
        version
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub async fn len(&self) -> usize {
        self.backend.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::InMemoryTileCache;

    fn cache() -> TileCache {
        TileCache::new(Arc::new(InMemoryTileCache::new(64)))
    }

    #[tokio::test]
    async fn invalidation_changes_keys_without_deleting_entries() {
        let cache = cache();
        let filters = ScopeFilters::for_album(5);
        let cell = GridCell::new(12, 40, -7);

        let before = cache.cell_key(cell, &filters);
        cache
            .put(before.clone(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        assert!(cache.get(&before).await.unwrap().is_some());

        cache.invalidate(Scope::Album(5));
        let after = cache.cell_key(cell, &filters);
        assert_ne!(before, after);
        assert!(cache.get(&after).await.unwrap().is_none());
        // The stale entry is orphaned, not erased.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidating_one_scope_leaves_others_readable() {
        let cache = cache();
        let cell = GridCell::new(10, 2, 3);
        let album = ScopeFilters::for_album(1);
        let global = ScopeFilters::none();

        let global_key = cache.cell_key(cell, &global);
        cache
            .put(global_key.clone(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();

        cache.invalidate(Scope::Album(1));
        assert_eq!(cache.cell_key(cell, &global), global_key);
        assert!(cache.get(&global_key).await.unwrap().is_some());
        assert_ne!(cache.cell_key(cell, &album), global_key);
    }

    #[tokio::test]
    async fn stats_count_hits_and_misses() {
        let cache = cache();
        let filters = ScopeFilters::none();
        let key = cache.cell_key(GridCell::new(8, 0, 0), &filters);

        assert!(cache.get(&key).await.unwrap().is_none());
        cache
            .put(key.clone(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        assert!(cache.get(&key).await.unwrap().is_some());

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1 });
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
