//! Merge laws checked over generated candidate sets.
//!
//! The unit tests in each strategy module pin down hand-picked
//! scenarios; these properties assert the cross-strategy contract for
//! arbitrary candidate vectors: merging never changes the total photo
//! count, and the output is independent of input order.

use proptest::prelude::*;

use photomap_core::ClusterCandidate;

use photomap_cluster::{
    DistanceMergeStrategy, LegacyMergeStrategy, MergeStrategy, PixelMergeStrategy,
};
use photomap_test_utils::{candidate_strategy, total_count};

fn strategies() -> Vec<Box<dyn MergeStrategy>> {
    vec![
        Box::new(LegacyMergeStrategy),
        Box::new(DistanceMergeStrategy::default()),
        Box::new(PixelMergeStrategy::default()),
    ]
}

/// Candidate vectors whose cells match the zoom they are merged at.
fn candidates_with_zoom() -> impl Strategy<Value = (u8, Vec<ClusterCandidate>)> {
    (10u8..=18).prop_flat_map(|zoom| {
        proptest::collection::vec(candidate_strategy(zoom), 1..24)
            .prop_map(move |candidates| (zoom, candidates))
    })
}

proptest! {
    #[test]
    fn prop_every_strategy_conserves_total_count(
        (zoom, candidates) in candidates_with_zoom(),
    ) {
        let before = total_count(&candidates);
        for strategy in strategies() {
            let merged = strategy.merge(candidates.clone(), zoom);
            let after: u64 = merged.iter().map(|m| m.count).sum();
            prop_assert_eq!(after, before, "strategy {:?}", strategy.kind());
            prop_assert!(!merged.is_empty());
        }
    }

    #[test]
    fn prop_merge_is_invariant_under_permutation(
        (zoom, candidates) in candidates_with_zoom(),
        rotation in 0usize..24,
    ) {
        let mut shuffled = candidates.clone();
        shuffled.reverse();
        let len = shuffled.len();
        shuffled.rotate_left(rotation % len);
        for strategy in strategies() {
            prop_assert_eq!(
                strategy.merge(candidates.clone(), zoom),
                strategy.merge(shuffled.clone(), zoom),
                "strategy {:?}",
                strategy.kind()
            );
        }
    }
}
