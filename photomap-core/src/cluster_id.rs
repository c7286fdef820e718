//! Stable string identifiers for displayed clusters.
//!
//! A cluster id encodes the representative grid cell of a merge group as
//! `z{zoom}_{cellX}_{cellY}`, optionally suffixed `_g{n}` when several
//! disjoint merge groups collapse onto the same representative cell. The
//! token doubles as a pagination cursor ("get photos in this cluster") and
//! as a cache invalidation match target, so encode→decode→encode must be
//! lossless.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::grid::{GridCell, MAX_ZOOM};

/// Strict anchored pattern. Loose splitting would accept partial or garbage
/// tokens; everything not matching this shape is rejected outright.
static CLUSTER_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^z(\d{1,2})_(-?\d+)_(-?\d+)(?:_g(\d+))?$").expect("cluster id pattern is valid")
});

/// Decoded form of a cluster identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId {
    pub cell: GridCell,
    /// Disambiguates merge groups sharing a representative cell.
    pub group_seq: Option<u32>,
}

impl ClusterId {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            group_seq: None,
        }
    }

    pub fn with_group_seq(cell: GridCell, group_seq: u32) -> Self {
        Self {
            cell,
            group_seq: Some(group_seq),
        }
    }

    /// Encode to the canonical token form.
    pub fn encode(&self) -> String {
        match self.group_seq {
            Some(seq) => format!(
                "z{}_{}_{}_g{}",
                self.cell.zoom, self.cell.cell_x, self.cell.cell_y, seq
            ),
            None => format!(
                "z{}_{}_{}",
                self.cell.zoom, self.cell.cell_x, self.cell.cell_y
            ),
        }
    }

    /// Decode a token, rejecting anything that does not match the canonical
    /// shape or carries an unsupported zoom.
    pub fn decode(text: &str) -> MapResult<Self> {
        let caps = CLUSTER_ID_RE
            .captures(text)
            .ok_or_else(|| MapError::malformed_cluster_id(text))?;

        let zoom: u8 = caps[1]
            .parse()
            .map_err(|_| MapError::malformed_cluster_id(text))?;
        if zoom > MAX_ZOOM {
            return Err(MapError::malformed_cluster_id(text));
        }
        let cell_x: i64 = caps[2]
            .parse()
            .map_err(|_| MapError::malformed_cluster_id(text))?;
        let cell_y: i64 = caps[3]
            .parse()
            .map_err(|_| MapError::malformed_cluster_id(text))?;
        let group_seq = match caps.get(4) {
            Some(seq) => Some(
                seq.as_str()
                    .parse::<u32>()
                    .map_err(|_| MapError::malformed_cluster_id(text))?,
            ),
            None => None,
        };

        Ok(Self {
            cell: GridCell::new(zoom, cell_x, cell_y),
            group_seq,
        })
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for ClusterId {
    type Err = MapError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::decode(text)
    }
}
