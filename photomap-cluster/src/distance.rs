//! Planar-distance merge over adjacent grid cells.
//!
//! Candidate centers are projected to Web-Mercator meters and connected
//! when they lie within a zoom-dependent threshold of each other. Only
//! pairs whose cells are within one grid step are compared, which bounds
//! the pairwise cost to each cell's 3x3 neighborhood. Connected components
//! are then folded with the shared merge mechanics.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use photomap_core::{grid_size_meters, ClusterCandidate, ClusterReadModel, GridCell};

use crate::projection::{lonlat_to_mercator_m, mercator_distance_m};
use crate::strategy::{
    finalize_clusters, fold_component, membership_from_components, split_and_canonicalize,
    MergeStrategy, MergeStrategyKind, ParsedCandidate,
};
use crate::union_find::UnionFind;

/// Lower clamp of the merge threshold, in meters.
pub const MIN_MERGE_DISTANCE_M: f64 = 120.0;
/// Upper clamp of the merge threshold, in meters.
pub const MAX_MERGE_DISTANCE_M: f64 = 900.0;

/// Fraction of the cell size used as merge distance, per zoom band.
/// Tuned constants; the clamp below dominates at low zoom.
fn merge_ratio(zoom: u8) -> f64 {
    match zoom {
        0..=11 => 0.10,
        12..=14 => 0.25,
        _ => 0.50,
    }
}

/// Zoom-dependent merge threshold in planar meters.
pub fn merge_threshold_m(zoom: u8) -> f64 {
    (grid_size_meters(zoom) * merge_ratio(zoom)).clamp(MIN_MERGE_DISTANCE_M, MAX_MERGE_DISTANCE_M)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DistanceMergeStrategy;

impl DistanceMergeStrategy {
    /// Connected components of the canonicalized candidate list.
    fn components(parsed: &[ParsedCandidate], zoom: u8) -> Vec<Vec<usize>> {
        let threshold = merge_threshold_m(zoom);
        let points: Vec<(f64, f64)> = parsed
            .iter()
            .map(|(c, _)| lonlat_to_mercator_m(c.center_lon, c.center_lat))
            .collect();

        let mut by_cell: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, (_, cell)) in parsed.iter().enumerate() {
            by_cell.entry((cell.cell_x, cell.cell_y)).or_default().push(i);
        }

        let mut uf = UnionFind::new(&points);
        for (i, (_, cell)) in parsed.iter().enumerate() {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(neighbors) = by_cell.get(&(cell.cell_x + dx, cell.cell_y + dy)) else {
                        continue;
                    };
                    for &j in neighbors {
                        if j > i && mercator_distance_m(points[i], points[j]) <= threshold {
                            uf.union(i, j);
                        }
                    }
                }
            }
        }
        uf.components(parsed.len())
    }
}

impl MergeStrategy for DistanceMergeStrategy {
    fn merge(&self, candidates: Vec<ClusterCandidate>, zoom: u8) -> Vec<ClusterReadModel> {
        if candidates.len() <= 1 {
            return candidates.into_iter().map(ClusterReadModel::from).collect();
        }
        let (parsed, passthrough) = split_and_canonicalize(candidates);
        let components = Self::components(&parsed, zoom);
        trace!(
            zoom,
            candidates = parsed.len(),
            clusters = components.len(),
            threshold_m = merge_threshold_m(zoom),
            "distance merge"
        );
        let clusters = components
            .iter()
            .map(|component| fold_component(zoom, &parsed, component))
            .collect();
        finalize_clusters(clusters, passthrough)
    }

    fn resolve_membership(
        &self,
        zoom: u8,
        candidates: &[ClusterCandidate],
        target: &GridCell,
    ) -> HashSet<GridCell> {
        let (parsed, _) = split_and_canonicalize(candidates.to_vec());
        let components = Self::components(&parsed, zoom);
        membership_from_components(&parsed, &components, target)
    }

    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomap_test_utils::{candidate_at, total_count};

    #[test]
    fn threshold_is_clamped_at_low_zoom() {
        // Cells at zoom 11 are ~19.5 km wide; the raw ratio blows past the
        // upper clamp.
        assert_eq!(merge_threshold_m(11), MAX_MERGE_DISTANCE_M);
        assert!(merge_threshold_m(22) >= MIN_MERGE_DISTANCE_M);
    }

    #[test]
    fn candidates_700m_apart_merge_at_zoom_11() {
        // ~700 m along the equator is ~0.0063 degrees.
        let a = candidate_at(11, 127.0000, 37.0, 4);
        let b = candidate_at(11, 127.0063, 37.0, 6);
        let merged = DistanceMergeStrategy.merge(vec![a, b], 11);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].count, 10);
    }

    #[test]
    fn candidates_2km_apart_stay_separate_at_zoom_11() {
        let a = candidate_at(11, 127.000, 37.0, 4);
        let b = candidate_at(11, 127.018, 37.0, 6);
        let merged = DistanceMergeStrategy.merge(vec![a, b], 11);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merged_centroid_is_count_weighted() {
        let a = candidate_at(11, 127.0000, 37.0, 1);
        let b = candidate_at(11, 127.0060, 37.0, 3);
        let merged = DistanceMergeStrategy.merge(vec![a, b], 11);
        assert_eq!(merged.len(), 1);
        let expected = (127.0 + 127.006 * 3.0) / 4.0;
        assert!((merged[0].longitude - expected).abs() < 1e-9);
    }

    #[test]
    fn single_candidate_is_identity() {
        let candidate = candidate_at(11, 127.0, 37.0, 9);
        let merged = DistanceMergeStrategy.merge(vec![candidate.clone()], 11);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cluster_id, candidate.id);
        assert!(DistanceMergeStrategy.merge(vec![], 11).is_empty());
    }

    #[test]
    fn unparsable_ids_pass_through() {
        let mut odd = candidate_at(11, 10.0, 10.0, 2);
        odd.id = "legacy-token-17".into();
        let ok = candidate_at(11, 127.0, 37.0, 5);
        let merged = DistanceMergeStrategy.merge(vec![odd.clone(), ok], 11);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|m| m.cluster_id == odd.id && m.count == 2));
    }

    #[test]
    fn count_is_conserved() {
        let candidates = vec![
            candidate_at(11, 127.000, 37.0, 4),
            candidate_at(11, 127.004, 37.0, 6),
            candidate_at(11, 127.050, 37.0, 1),
            candidate_at(11, 128.000, 36.0, 11),
        ];
        let before = total_count(&candidates);
        let merged = DistanceMergeStrategy.merge(candidates, 11);
        assert_eq!(merged.iter().map(|m| m.count).sum::<u64>(), before);
    }

    #[test]
    fn output_is_invariant_under_permutation() {
        let candidates = vec![
            candidate_at(13, 127.000, 37.000, 4),
            candidate_at(13, 127.002, 37.001, 6),
            candidate_at(13, 127.100, 37.050, 1),
            candidate_at(13, 126.900, 36.950, 2),
        ];
        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(
            DistanceMergeStrategy.merge(candidates, 13),
            DistanceMergeStrategy.merge(reversed, 13)
        );
    }

    #[test]
    fn membership_covers_the_merged_cells() {
        let a = candidate_at(11, 127.0000, 37.0, 4);
        let b = candidate_at(11, 127.0063, 37.0, 6);
        let cell_a = a.cell().unwrap();
        let cell_b = b.cell().unwrap();
        let candidates = vec![a, b];

        let members = DistanceMergeStrategy.resolve_membership(11, &candidates, &cell_a);
        assert!(members.contains(&cell_a));
        assert!(members.contains(&cell_b) || cell_a == cell_b);

        let elsewhere = GridCell::new(11, 9999, 9999);
        let fallback = DistanceMergeStrategy.resolve_membership(11, &candidates, &elsewhere);
        assert_eq!(fallback, HashSet::from([elsewhere]));
    }
}
