//! PHOTOMAP Test Utilities
//!
//! Centralized test infrastructure for the workspace: deterministic
//! fixtures for candidates and photos, and a proptest strategy for
//! candidate sets. Everything here is deterministic so tests stay
//! reproducible.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use photomap_core::{ClusterCandidate, ClusterId, GridCell, PhotoProjection};

// Re-export the in-memory read port so test crates need only one dev
// dependency.
pub use photomap_storage::read_port::{InMemoryReadPort, StoredPhoto};

// ============================================================================
// FIXTURES
// ============================================================================

/// Fixed reference instant for deterministic fixtures.
pub fn fixture_time(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0)
        .single()
        .expect("fixture timestamp is valid")
}

/// A candidate aggregated at the cell containing `(lon, lat)`, centered on
/// that point.
pub fn candidate_at(zoom: u8, lon: f64, lat: f64, count: u64) -> ClusterCandidate {
    let cell = GridCell::containing(zoom, lon, lat);
    ClusterCandidate {
        id: ClusterId::new(cell).encode(),
        count,
        center_lon: lon,
        center_lat: lat,
        thumbnail_url: format!("https://img.example/{}_{}.jpg", cell.cell_x, cell.cell_y),
        taken_at: fixture_time(count as i64),
    }
}

/// Sum of candidate counts, for conservation assertions.
pub fn total_count(candidates: &[ClusterCandidate]) -> u64 {
    candidates.iter().map(|c| c.count).sum()
}

/// A photo projection at a point with a deterministic id.
pub fn photo_at(lon: f64, lat: f64, seq: u32) -> PhotoProjection {
    PhotoProjection {
        photo_id: Uuid::from_u128(0x5050_0000_0000_0000_0000_0000_0000_0000 + u128::from(seq)),
        longitude: lon,
        latitude: lat,
        thumbnail_url: format!("https://img.example/photo_{seq}.jpg"),
        taken_at: fixture_time(i64::from(seq)),
    }
}

/// A stored photo for the in-memory read port.
pub fn stored_photo_at(
    lon: f64,
    lat: f64,
    seq: u32,
    collection_id: Option<i64>,
    album_id: Option<i64>,
) -> StoredPhoto {
    StoredPhoto {
        projection: photo_at(lon, lat, seq),
        collection_id,
        album_id,
    }
}

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Candidates near a common locality, so merges actually occur.
pub fn candidate_strategy(zoom: u8) -> impl Strategy<Value = ClusterCandidate> {
    (126.0f64..128.0, 36.0f64..38.0, 1u64..50)
        .prop_map(move |(lon, lat, count)| candidate_at(zoom, lon, lat, count))
}
