//! Monotonic per-scope version counters.
//!
//! Every cache key embeds the current version of its owning scope.
//! Bumping a scope's counter therefore orphans all of its entries at
//! once without touching the backend; the stale entries age out of the
//! LRU on their own.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::read_port::ScopeFilters;

/// Granularity at which tile cache entries are grouped for invalidation.
/// The most specific scope in a query wins: an album-filtered tile lives
/// under its album scope, not under the collection's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Collection(i64),
    Album(i64),
}

impl Scope {
    pub fn from_filters(filters: &ScopeFilters) -> Self {
        if let Some(album_id) = filters.album_id {
            Scope::Album(album_id)
        } else if let Some(collection_id) = filters.collection_id {
            Scope::Collection(collection_id)
        } else {
            Scope::Global
        }
    }
}

/// Concurrent map of scope to version. Unknown scopes read as version 0
/// so fresh scopes produce stable keys without a prior write.
#[derive(Debug, Default)]
pub struct ScopeVersions {
    versions: DashMap<Scope, AtomicU64>,
}

impl ScopeVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, scope: Scope) -> u64 {
        self.versions
            .get(&scope)
            .map(|v| v.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Advances the scope's version and returns the new value. Entries
    /// written under earlier versions become unreachable.
    pub fn bump(&self, scope: Scope) -> u64 {
        let entry = self.versions.entry(scope).or_insert_with(|| AtomicU64::new(0));
        entry.fetch_add(1, Ordering::AcqRel) + 1
    }
}
