//! World-pixel merge with complete-linkage extent bounds.
//!
//! Candidate centers are projected to world-pixel coordinates at the query
//! zoom (fractional zoom supported). Neighbor pairs come from a spatial
//! hash bucketed at the merge-distance scale, so no O(n^2) scan. A union
//! is accepted only if the merged group's pixel bounding box stays within
//! the per-axis thresholds: naive pairwise union-find would let a chain of
//! barely-overlapping pairs (A-B close, B-C close, A-C far) collapse into
//! one arbitrarily wide cluster, so a union that would stretch the group
//! past the limit is rejected even transitively.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use photomap_core::{ClusterCandidate, ClusterReadModel, GridCell};

use crate::projection::lonlat_to_world_px;
use crate::strategy::{
    finalize_clusters, fold_component, membership_from_components, split_and_canonicalize,
    MergeStrategy, MergeStrategyKind, ParsedCandidate,
};
use crate::union_find::UnionFind;

/// Tuning knobs for the pixel merge.
///
/// The marker dimensions and overlap ratio are tuned constants carried over
/// as configuration; two markers are considered overlapping when they are
/// closer than `marker size * (1 - required overlap)` on an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMergeConfig {
    /// On-screen marker width in pixels.
    pub marker_width_px: f64,
    /// On-screen marker height in pixels.
    pub marker_height_px: f64,
    /// Fraction of the marker that must overlap before two pins merge.
    pub required_overlap_ratio: f64,
}

impl Default for PixelMergeConfig {
    fn default() -> Self {
        Self {
            marker_width_px: 60.0,
            marker_height_px: 60.0,
            required_overlap_ratio: 0.25,
        }
    }
}

impl PixelMergeConfig {
    /// Maximum horizontal pixel span of a merged group.
    pub fn max_span_x(&self) -> f64 {
        self.marker_width_px * (1.0 - self.required_overlap_ratio)
    }

    /// Maximum vertical pixel span of a merged group.
    pub fn max_span_y(&self) -> f64 {
        self.marker_height_px * (1.0 - self.required_overlap_ratio)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PixelMergeStrategy {
    pub config: PixelMergeConfig,
}

impl PixelMergeStrategy {
    pub fn new(config: PixelMergeConfig) -> Self {
        Self { config }
    }

    /// Merge groups of the canonicalized candidate list.
    ///
    /// Edges are processed closest-first with index tie-breaks; since the
    /// candidate list is canonically ordered, the grouping is independent
    /// of the caller's input order.
    fn components(&self, parsed: &[ParsedCandidate], zoom: u8) -> Vec<Vec<usize>> {
        let max_x = self.config.max_span_x();
        let max_y = self.config.max_span_y();
        let bucket = max_x.max(max_y);

        let points: Vec<(f64, f64)> = parsed
            .iter()
            .map(|(c, _)| lonlat_to_world_px(c.center_lon, c.center_lat, f64::from(zoom)))
            .collect();

        let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, &(x, y)) in points.iter().enumerate() {
            buckets
                .entry(((x / bucket).floor() as i64, (y / bucket).floor() as i64))
                .or_default()
                .push(i);
        }

        let mut edges: Vec<(f64, usize, usize)> = Vec::new();
        for (i, &(x, y)) in points.iter().enumerate() {
            let (bx, by) = ((x / bucket).floor() as i64, (y / bucket).floor() as i64);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(neighbors) = buckets.get(&(bx + dx, by + dy)) else {
                        continue;
                    };
                    for &j in neighbors {
                        if j <= i {
                            continue;
                        }
                        let (jx, jy) = points[j];
                        if (jx - x).abs() <= max_x && (jy - y).abs() <= max_y {
                            let dist = ((jx - x).powi(2) + (jy - y).powi(2)).sqrt();
                            edges.push((dist, i, j));
                        }
                    }
                }
            }
        }
        edges.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut uf = UnionFind::new(&points);
        for (_, i, j) in edges {
            uf.try_union(i, j, max_x, max_y);
        }
        uf.components(parsed.len())
    }
}

impl MergeStrategy for PixelMergeStrategy {
    fn merge(&self, candidates: Vec<ClusterCandidate>, zoom: u8) -> Vec<ClusterReadModel> {
        if candidates.len() <= 1 {
            return candidates.into_iter().map(ClusterReadModel::from).collect();
        }
        let (parsed, passthrough) = split_and_canonicalize(candidates);
        let components = self.components(&parsed, zoom);
        trace!(
            zoom,
            candidates = parsed.len(),
            clusters = components.len(),
            "pixel merge"
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
        let components = self.components(&parsed, zoom);
        membership_from_components(&parsed, &components, target)
    }

    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomap_core::grid_size;
    use photomap_test_utils::{candidate_at, total_count};

    /// Longitude offset that equals `px` pixels at the given zoom (equator).
    fn lon_for_px(px: f64, zoom: u8) -> f64 {
        px * 360.0 / (256.0 * f64::from(zoom).exp2())
    }

    #[test]
    fn overlapping_markers_merge() {
        let zoom = 16;
        let step = lon_for_px(30.0, zoom);
        let a = candidate_at(zoom, 127.0, 37.0, 2);
        let b = candidate_at(zoom, 127.0 + step, 37.0, 3);
        let merged = PixelMergeStrategy::default().merge(vec![a, b], zoom);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].count, 5);
    }

    #[test]
    fn distant_markers_stay_separate() {
        let zoom = 16;
        let step = lon_for_px(200.0, zoom);
        let a = candidate_at(zoom, 127.0, 37.0, 2);
        let b = candidate_at(zoom, 127.0 + step, 37.0, 3);
        let merged = PixelMergeStrategy::default().merge(vec![a, b], zoom);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn chain_of_pairs_does_not_collapse() {
        // A-B and B-C are each 30 px apart, A-C is 60 px: beyond the 45 px
        // span limit. Complete-linkage safety must yield exactly two
        // groups, not one three-member cluster.
        let zoom = 16;
        let step = lon_for_px(30.0, zoom);
        let a = candidate_at(zoom, 127.0, 37.0, 1);
        let b = candidate_at(zoom, 127.0 + step, 37.0, 1);
        let c = candidate_at(zoom, 127.0 + 2.0 * step, 37.0, 1);
        let merged = PixelMergeStrategy::default().merge(vec![a, b, c], zoom);
        assert_eq!(merged.len(), 2);
        let mut counts: Vec<u64> = merged.iter().map(|m| m.count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn duplicate_representatives_get_group_suffixes() {
        // Three candidates inside one cell at a low zoom, pairwise far in
        // pixels: three disjoint groups all rounding to the same cell.
        let zoom = 6;
        let cell_width = grid_size(zoom);
        let base = (127.0 / cell_width).floor() * cell_width;
        let spread = cell_width / 4.0;
        let candidates = vec![
            candidate_at(zoom, base + spread, 37.0, 1),
            candidate_at(zoom, base + 2.0 * spread, 37.0, 2),
            candidate_at(zoom, base + 3.0 * spread, 37.0, 3),
        ];
        let merged = PixelMergeStrategy::default().merge(candidates, zoom);
        assert_eq!(merged.len(), 3);
        let ids: HashSet<&str> = merged.iter().map(|m| m.cluster_id.as_str()).collect();
        assert_eq!(ids.len(), 3, "duplicate cluster ids in {merged:?}");
        assert!(merged.iter().any(|m| m.cluster_id.ends_with("_g1")));
        assert!(merged.iter().any(|m| m.cluster_id.ends_with("_g2")));
    }

    #[test]
    fn count_is_conserved() {
        let zoom = 15;
        let step = lon_for_px(25.0, zoom);
        let candidates: Vec<_> = (0..7u32)
            .map(|i| candidate_at(zoom, 127.0 + f64::from(i) * step, 37.0, u64::from(i) + 1))
            .collect();
        let before = total_count(&candidates);
        let merged = PixelMergeStrategy::default().merge(candidates, zoom);
        assert_eq!(merged.iter().map(|m| m.count).sum::<u64>(), before);
    }

    #[test]
    fn output_is_invariant_under_permutation() {
        let zoom = 16;
        let step = lon_for_px(28.0, zoom);
        let candidates: Vec<_> = (0..6u32)
            .map(|i| candidate_at(zoom, 127.0 + f64::from(i) * step, 37.0 + f64::from(i % 2) * step, u64::from(i) + 1))
            .collect();
        let mut shuffled = candidates.clone();
        shuffled.rotate_left(3);
        shuffled.swap(0, 4);
        let strategy = PixelMergeStrategy::default();
        assert_eq!(strategy.merge(candidates, zoom), strategy.merge(shuffled, zoom));
    }

    #[test]
    fn single_candidate_is_identity() {
        let candidate = candidate_at(16, 127.0, 37.0, 9);
        let merged = PixelMergeStrategy::default().merge(vec![candidate.clone()], 16);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cluster_id, candidate.id);
    }

    #[test]
    fn unparsable_ids_pass_through() {
        let mut odd = candidate_at(16, 10.0, 10.0, 4);
        odd.id = "??".into();
        let ok = candidate_at(16, 127.0, 37.0, 5);
        let merged = PixelMergeStrategy::default().merge(vec![odd.clone(), ok], 16);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|m| m.cluster_id == odd.id && m.count == 4));
    }
}
