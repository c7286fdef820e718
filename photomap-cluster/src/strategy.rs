//! Merge strategy seam and shared merge mechanics.
//!
//! A strategy answers two questions: how raw per-cell candidates combine
//! into displayed pins (`merge`), and which raw cells a displayed cluster
//! was built from (`resolve_membership`, the inverse needed to paginate a
//! cluster's photos).
//!
//! Every strategy obeys the same laws: total photo count is conserved, no
//! output cluster has an empty member set, zero or one candidates are
//! returned as-is, and candidates with unparsable ids pass through
//! untouched rather than being dropped.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use photomap_core::{ClusterCandidate, ClusterId, ClusterReadModel, GridCell};

use crate::distance::DistanceMergeStrategy;
use crate::legacy::LegacyMergeStrategy;
use crate::pixel::PixelMergeStrategy;

/// Cross-cell merge of raw cluster candidates.
pub trait MergeStrategy: Send + Sync {
    /// Combine adjacent per-cell candidates into displayed clusters.
    fn merge(&self, candidates: Vec<ClusterCandidate>, zoom: u8) -> Vec<ClusterReadModel>;

    /// The raw cells making up the displayed cluster whose representative
    /// is `target`. Returns `{target}` when the cell is not part of any
    /// merge group of the given candidate set.
    fn resolve_membership(
        &self,
        zoom: u8,
        candidates: &[ClusterCandidate],
        target: &GridCell,
    ) -> HashSet<GridCell>;

    /// Configuration name of this strategy.
    fn kind(&self) -> MergeStrategyKind;
}

/// Which merge implementation to run; selected by configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategyKind {
    /// Identity pass-through; baseline and fallback.
    Legacy,
    /// Planar-meter threshold merge over adjacent cells.
    #[default]
    Distance,
    /// World-pixel merge with complete-linkage extent bounds.
    Pixel,
}

impl MergeStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Distance => "distance",
            Self::Pixel => "pixel",
        }
    }
}

/// Unknown strategy names fail configuration instead of silently falling
/// back to a default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown merge strategy '{0}' (expected legacy, distance, or pixel)")]
pub struct UnknownStrategy(pub String);

impl FromStr for MergeStrategyKind {
    type Err = UnknownStrategy;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "distance" => Ok(Self::Distance),
            "pixel" => Ok(Self::Pixel),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Map a configured kind to a strategy instance.
pub fn strategy_for(kind: MergeStrategyKind) -> Arc<dyn MergeStrategy> {
    match kind {
        MergeStrategyKind::Legacy => Arc::new(LegacyMergeStrategy),
        MergeStrategyKind::Distance => Arc::new(DistanceMergeStrategy::default()),
        MergeStrategyKind::Pixel => Arc::new(PixelMergeStrategy::default()),
    }
}

// ============================================================================
// SHARED MERGE MECHANICS
// ============================================================================

/// A candidate with a successfully decoded grid cell.
pub(crate) type ParsedCandidate = (ClusterCandidate, GridCell);

/// Split candidates into decodable and pass-through sets, and put the
/// decodable ones into canonical `(cell_y, cell_x, id)` order so that all
/// later index-based processing is independent of input order.
pub(crate) fn split_and_canonicalize(
    candidates: Vec<ClusterCandidate>,
) -> (Vec<ParsedCandidate>, Vec<ClusterCandidate>) {
    let mut parsed = Vec::with_capacity(candidates.len());
    let mut passthrough = Vec::new();
    for candidate in candidates {
        match candidate.cell() {
            Some(cell) => parsed.push((candidate, cell)),
            None => passthrough.push(candidate),
        }
    }
    // Same-cell candidates share an id, so coordinates break the tie.
    parsed.sort_by(|a, b| {
        (a.1.cell_y, a.1.cell_x, a.0.id.as_str())
            .cmp(&(b.1.cell_y, b.1.cell_x, b.0.id.as_str()))
            .then(a.0.center_lon.total_cmp(&b.0.center_lon))
            .then(a.0.center_lat.total_cmp(&b.0.center_lat))
            .then(a.0.count.cmp(&b.0.count))
    });
    passthrough.sort_by(|a, b| a.id.cmp(&b.id));
    (parsed, passthrough)
}

/// Fold one component of parsed candidates into a read model.
///
/// The representative cell is the member with the smallest `(cell_y,
/// cell_x)`, a deterministic tie-break independent of input order. The
/// centroid is the photo-count-weighted mean of member centers and the
/// thumbnail comes from the highest-count member.
pub(crate) fn fold_component(
    zoom: u8,
    parsed: &[ParsedCandidate],
    member_indices: &[usize],
) -> (GridCell, ClusterReadModel) {
    debug_assert!(!member_indices.is_empty());

    let rep_cell = member_indices
        .iter()
        .map(|&i| parsed[i].1)
        .min_by_key(|cell| (cell.cell_y, cell.cell_x))
        .map(|cell| GridCell::new(zoom, cell.cell_x, cell.cell_y))
        .expect("component is non-empty");

    let mut total: u64 = 0;
    let mut lon_sum = 0.0;
    let mut lat_sum = 0.0;
    for &i in member_indices {
        let candidate = &parsed[i].0;
        total += candidate.count;
        lon_sum += candidate.center_lon * candidate.count as f64;
        lat_sum += candidate.center_lat * candidate.count as f64;
    }
    let weight = total.max(1) as f64;

    // Highest-count member wins the thumbnail; ties fall back to the
    // canonical candidate ordering, which is input-order independent.
    let lead = member_indices
        .iter()
        .map(|&i| &parsed[i])
        .max_by(|a, b| a.0.count.cmp(&b.0.count).then_with(|| b.0.id.cmp(&a.0.id)))
        .expect("component is non-empty");

    let model = ClusterReadModel {
        cluster_id: ClusterId::new(rep_cell).encode(),
        count: total,
        thumbnail_url: lead.0.thumbnail_url.clone(),
        longitude: lon_sum / weight,
        latitude: lat_sum / weight,
        taken_at: lead.0.taken_at,
    };
    (rep_cell, model)
}

/// Order clusters by representative cell and disambiguate duplicate
/// representative ids with `_g{n}` suffixes: the first group keeps the base
/// token, later ones get `_g1`, `_g2`, ... in deterministic order.
pub(crate) fn finalize_clusters(
    mut clusters: Vec<(GridCell, ClusterReadModel)>,
    passthrough: Vec<ClusterCandidate>,
) -> Vec<ClusterReadModel> {
    clusters.sort_by(|a, b| {
        (a.0.cell_y, a.0.cell_x)
            .cmp(&(b.0.cell_y, b.0.cell_x))
            .then(b.1.count.cmp(&a.1.count))
            .then(a.1.longitude.total_cmp(&b.1.longitude))
            .then(a.1.latitude.total_cmp(&b.1.latitude))
    });

    let mut out: Vec<ClusterReadModel> = Vec::with_capacity(clusters.len() + passthrough.len());
    let mut previous_cell: Option<GridCell> = None;
    let mut seq = 0u32;
    for (cell, mut model) in clusters {
        if previous_cell == Some(cell) {
            seq += 1;
            model.cluster_id = ClusterId::with_group_seq(cell, seq).encode();
        } else {
            seq = 0;
            previous_cell = Some(cell);
        }
        out.push(model);
    }

    // Pass-through candidates keep their raw ids untouched.
    out.extend(passthrough.into_iter().map(ClusterReadModel::from));
    out
}

/// Membership answer for a component-based strategy: the member cells of
/// the group containing `target`, or `{target}` alone.
pub(crate) fn membership_from_components(
    parsed: &[ParsedCandidate],
    components: &[Vec<usize>],
    target: &GridCell,
) -> HashSet<GridCell> {
    for component in components {
        if component.iter().any(|&i| parsed[i].1 == *target) {
            return component.iter().map(|&i| parsed[i].1).collect();
        }
    }
    HashSet::from([*target])
}
