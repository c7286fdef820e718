//! Union-find over projected candidate points.
//!
//! Each root carries the planar bounding box of its component so that the
//! pixel strategy can enforce complete-linkage safety: a union that would
//! stretch the combined extent past the per-axis limits is rejected up
//! front, keeping the structure always valid instead of rolling back.

/// Planar extent of one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    pub fn merged(&self, other: &Extent) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Disjoint-set forest with path halving, union by size, and per-root
/// extent aggregates.
#[derive(Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    extent: Vec<Extent>,
}

impl UnionFind {
    /// One singleton component per point.
    pub fn new(points: &[(f64, f64)]) -> Self {
        Self {
            parent: (0..points.len()).collect(),
            size: vec![1; points.len()],
            extent: points.iter().map(|&(x, y)| Extent::at(x, y)).collect(),
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Unconditional union. Returns false if already connected.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.link(ra, rb);
        true
    }

    /// Union only if the combined extent stays within `max_width` and
    /// `max_height` on its respective axes. A rejected union leaves the
    /// structure untouched.
    pub fn try_union(&mut self, a: usize, b: usize, max_width: f64, max_height: f64) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let combined = self.extent[ra].merged(&self.extent[rb]);
        if combined.width() > max_width || combined.height() > max_height {
            return false;
        }
        self.link(ra, rb);
        true
    }

    fn link(&mut self, ra: usize, rb: usize) {
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        self.extent[big] = self.extent[big].merged(&self.extent[small]);
    }

    /// Group element indices into components. Components are ordered by
    /// their smallest member index, members ascending, so the output is
    /// deterministic for a fixed element indexing.
    pub fn components(&mut self, n: usize) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Option<usize>> = vec![None; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = self.find(i);
            match by_root[root] {
                Some(slot) => groups[slot].push(i),
                None => {
                    by_root[root] = Some(groups.len());
                    groups.push(vec![i]);
                }
            }
        }
        groups
    }
}
