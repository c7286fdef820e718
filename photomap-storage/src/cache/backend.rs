//! Pluggable tile cache storage.
//!
//! The engine only needs get/put over string keys; the default backend
//! is an in-process LRU, but the trait leaves room for an external
//! store behind the same surface.

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

use photomap_core::{ClusterCandidate, MapResult, PhotoProjection};

/// Payload stored under a tile key. An empty candidate list is a valid
/// entry: it records that a cell is known to be empty, so empty ocean
/// does not re-query the read side on every pan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum TileValue {
    Candidates(Vec<ClusterCandidate>),
    Photos(Vec<PhotoProjection>),
}

#[async_trait]
pub trait TileCacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> MapResult<Option<TileValue>>;
    async fn put(&self, key: String, value: TileValue) -> MapResult<()>;
    async fn len(&self) -> usize;
}

/// Bounded in-process backend. Capacity is entries, not bytes; stale
/// versions are never deleted explicitly, they fall off the LRU tail.
pub struct InMemoryTileCache {
    entries: Mutex<LruCache<String, TileValue>>,
}

impl InMemoryTileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl TileCacheBackend for InMemoryTileCache {
    async fn get(&self, key: &str) -> MapResult<Option<TileValue>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: String, value: TileValue) -> MapResult<()> {
        self.entries.lock().await.put(key, value);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let cache = InMemoryTileCache::new(8);
        cache
            .put("z10_x1_y1_c0_a0_v0".into(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        let hit = cache.get("z10_x1_y1_c0_a0_v0").await.unwrap();
        assert_eq!(hit, Some(TileValue::Candidates(Vec::new())));
        assert_eq!(cache.get("z10_x2_y1_c0_a0_v0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = InMemoryTileCache::new(2);
        cache
            .put("a".into(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        cache
            .put("b".into(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        // Touch "a" so "b" becomes the eviction victim.
        cache.get("a").await.unwrap();
        cache
            .put("c".into(), TileValue::Candidates(Vec::new()))
            .await
            .unwrap();
        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert_eq!(cache.len().await, 2);
    }

    #[test]
    fn tile_value_serde_shape_is_stable() {
        let value = TileValue::Photos(Vec::new());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"photos","items":[]}"#);
        let back: TileValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
