//! Identity merge: every candidate becomes its own pin.

use std::collections::HashSet;

use photomap_core::{ClusterCandidate, ClusterReadModel, GridCell};

use crate::strategy::{MergeStrategy, MergeStrategyKind};

/// Baseline strategy: no cross-cell merging at all. Kept as a fallback and
/// as the reference behavior the other strategies must conserve counts
/// against.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyMergeStrategy;

impl MergeStrategy for LegacyMergeStrategy {
    fn merge(&self, candidates: Vec<ClusterCandidate>, _zoom: u8) -> Vec<ClusterReadModel> {
        candidates.into_iter().map(ClusterReadModel::from).collect()
    }

    fn resolve_membership(
        &self,
        _zoom: u8,
        _candidates: &[ClusterCandidate],
        target: &GridCell,
    ) -> HashSet<GridCell> {
        HashSet::from([*target])
    }

    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Legacy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomap_test_utils::candidate_at;

    #[test]
    fn merge_is_identity() {
        let candidates = vec![
            candidate_at(11, 127.01, 37.51, 3),
            candidate_at(11, 127.20, 37.52, 5),
        ];
        let merged = LegacyMergeStrategy.merge(candidates.clone(), 11);
        assert_eq!(merged.len(), 2);
        for (candidate, model) in candidates.iter().zip(&merged) {
            assert_eq!(model.cluster_id, candidate.id);
            assert_eq!(model.count, candidate.count);
        }
    }

    #[test]
    fn membership_is_only_the_exact_cell() {
        let target = GridCell::new(11, 4, 7);
        let members = LegacyMergeStrategy.resolve_membership(11, &[], &target);
        assert_eq!(members, HashSet::from([target]));
    }
}
