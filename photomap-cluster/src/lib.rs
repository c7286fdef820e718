//! PHOTOMAP Cluster - Boundary Merge Strategies
//!
//! Turns raw per-cell cluster candidates into the pins a map client
//! actually draws. Three interchangeable strategies sit behind the
//! [`MergeStrategy`] trait, selected by configuration at startup:
//!
//! - [`LegacyMergeStrategy`]: identity pass-through, the baseline.
//! - [`DistanceMergeStrategy`]: planar-meter threshold merge between
//!   adjacent grid cells.
//! - [`PixelMergeStrategy`]: world-pixel merge with complete-linkage
//!   extent bounds, preventing transitive chain collapse.
//!
//! All strategies are pure and stateless; they are safe to share across
//! workers without locking.

pub mod distance;
pub mod legacy;
pub mod pixel;
pub mod projection;
pub mod strategy;
pub mod union_find;

pub use distance::{
    merge_threshold_m, DistanceMergeStrategy, MAX_MERGE_DISTANCE_M, MIN_MERGE_DISTANCE_M,
};
pub use legacy::LegacyMergeStrategy;
pub use pixel::{PixelMergeConfig, PixelMergeStrategy};
pub use strategy::{strategy_for, MergeStrategy, MergeStrategyKind, UnknownStrategy};
pub use union_find::{Extent, UnionFind};
