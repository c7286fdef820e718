//! Rectangular viewport handling.
//!
//! Viewports arrive either as raw `west,south,east,north` literals or are
//! derived from a center point plus zoom. Derived viewports snap outward to
//! grid boundaries so that viewport edges align with cluster cell edges and
//! no cluster is clipped in half at a tile edge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::grid::{grid_size, GridCell};

/// Horizontal half-span of a derived viewport, in grid cells.
///
/// Wider than the vertical span; tuned for portrait mobile viewports where
/// panning is predominantly horizontal.
pub const HORIZONTAL_SPAN_FACTOR: f64 = 3.0;
/// Vertical half-span of a derived viewport, in grid cells.
pub const VERTICAL_SPAN_FACTOR: f64 = 2.0;

/// Geographic bounding box in degrees.
///
/// Invariant: `west < east` and `south < north`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BBox {
    /// Validating constructor.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> MapResult<Self> {
        let raw = format!("{west},{south},{east},{north}");
        if !(west.is_finite() && south.is_finite() && east.is_finite() && north.is_finite()) {
            return Err(MapError::malformed_bbox(raw, "non-finite edge"));
        }
        if west >= east {
            return Err(MapError::malformed_bbox(raw, "west must be less than east"));
        }
        if south >= north {
            return Err(MapError::malformed_bbox(raw, "south must be less than north"));
        }
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// The full longitude/latitude plane; default service region.
    pub fn world() -> Self {
        Self {
            west: -180.0,
            south: -90.0,
            east: 180.0,
            north: 90.0,
        }
    }

    /// Build a viewport around a center point at the given zoom.
    ///
    /// The point is expanded by [`HORIZONTAL_SPAN_FACTOR`] grid widths and
    /// [`VERTICAL_SPAN_FACTOR`] grid heights on each side, then all four
    /// edges snap outward to the grid so cells are never half-visible.
    /// Latitude is clamped to `[-90, 90]`.
    pub fn from_center(zoom: u8, lon: f64, lat: f64) -> Self {
        let size = grid_size(zoom);
        let lat = lat.clamp(-90.0, 90.0);
        let raw = Self {
            west: lon - size * HORIZONTAL_SPAN_FACTOR,
            east: lon + size * HORIZONTAL_SPAN_FACTOR,
            south: (lat - size * VERTICAL_SPAN_FACTOR).max(-90.0),
            north: (lat + size * VERTICAL_SPAN_FACTOR).min(90.0),
        };
        raw.snap_to_grid(zoom)
    }

    /// Snap all four edges outward to the nearest grid boundary at `zoom`.
    pub fn snap_to_grid(&self, zoom: u8) -> Self {
        let size = grid_size(zoom);
        Self {
            west: (self.west / size).floor() * size,
            south: (self.south / size).floor() * size,
            east: (self.east / size).ceil() * size,
            north: (self.north / size).ceil() * size,
        }
    }

    /// Expand by half a grid cell on every side (the read-port margin that
    /// keeps clusters at the viewport edge from being clipped).
    pub fn expand_by_margin(&self, zoom: u8) -> Self {
        let margin = grid_size(zoom) / 2.0;
        Self {
            west: self.west - margin,
            south: (self.south - margin).max(-90.0),
            east: self.east + margin,
            north: (self.north + margin).min(90.0),
        }
    }

    /// Intersect with a service region. `None` means no overlap, which maps
    /// to an empty query result rather than an error.
    pub fn clamp_to_region(&self, region: &BBox) -> Option<Self> {
        let west = self.west.max(region.west);
        let south = self.south.max(region.south);
        let east = self.east.min(region.east);
        let north = self.north.min(region.north);
        if west >= east || south >= north {
            return None;
        }
        Some(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon < self.east && lat >= self.south && lat < self.north
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.west < other.east
            && other.west < self.east
            && self.south < other.north
            && other.south < self.north
    }

    /// Number of grid cells this box spans at `zoom`.
    pub fn cell_count(&self, zoom: u8) -> u64 {
        let size = grid_size(zoom);
        let cols = ((self.east / size).ceil() - (self.west / size).floor()).max(0.0) as u64;
        let rows = ((self.north / size).ceil() - (self.south / size).floor()).max(0.0) as u64;
        cols.saturating_mul(rows)
    }

    /// All grid cells intersecting this box at `zoom`, row-major from the
    /// south-west corner.
    pub fn grid_cells(&self, zoom: u8) -> Vec<GridCell> {
        let size = grid_size(zoom);
        let x0 = (self.west / size).floor() as i64;
        let x1 = (self.east / size).ceil() as i64;
        let y0 = (self.south / size).floor() as i64;
        let y1 = (self.north / size).ceil() as i64;
        let mut cells = Vec::with_capacity(((x1 - x0).max(0) * (y1 - y0).max(0)) as usize);
        for cell_y in y0..y1 {
            for cell_x in x0..x1 {
                cells.push(GridCell::new(zoom, cell_x, cell_y));
            }
        }
        cells
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl FromStr for BBox {
    type Err = MapError;

    /// Parse a 4-field comma-separated literal: `west,south,east,north`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != 4 {
            return Err(MapError::malformed_bbox(
                text,
                format!("expected 4 comma-separated fields, got {}", fields.len()),
            ));
        }
        let mut edges = [0.0f64; 4];
        for (slot, field) in edges.iter_mut().zip(&fields) {
            *slot = field
                .trim()
                .parse::<f64>()
                .map_err(|_| MapError::malformed_bbox(text, format!("invalid number '{field}'")))?;
        }
        Self::new(edges[0], edges[1], edges[2], edges[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_size;

    #[test]
    fn parse_roundtrip() {
        let bbox: BBox = "126.9,37.4,127.1,37.6".parse().unwrap();
        assert_eq!(bbox.west, 126.9);
        assert_eq!(bbox.north, 37.6);
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        let err = "1,2,3".parse::<BBox>().unwrap_err();
        assert!(matches!(err, MapError::MalformedBBox { .. }));
        let err = "1,2,3,4,5".parse::<BBox>().unwrap_err();
        assert!(matches!(err, MapError::MalformedBBox { .. }));
    }

    #[test]
    fn parse_rejects_garbage_numbers() {
        let err = "a,2,3,4".parse::<BBox>().unwrap_err();
        assert!(matches!(err, MapError::MalformedBBox { .. }));
    }

    #[test]
    fn new_rejects_inverted_edges() {
        assert!(BBox::new(10.0, 0.0, 5.0, 1.0).is_err());
        assert!(BBox::new(0.0, 10.0, 5.0, 1.0).is_err());
    }

    #[test]
    fn from_center_aligns_to_grid() {
        let zoom = 14;
        let size = grid_size(zoom);
        let bbox = BBox::from_center(zoom, 127.0321, 37.5123);
        for edge in [bbox.west, bbox.south, bbox.east, bbox.north] {
            let rem = (edge / size).fract();
            assert!(rem.abs() < 1e-9, "edge {edge} not on grid boundary");
        }
        assert!(bbox.contains(127.0321, 37.5123));
        // Horizontal span is wider than vertical.
        assert!(bbox.east - bbox.west > bbox.north - bbox.south);
    }

    #[test]
    fn from_center_clamps_latitude() {
        let bbox = BBox::from_center(5, 0.0, 89.9);
        assert!(bbox.north <= 90.0 + 1e-9);
    }

    #[test]
    fn clamp_to_region_disjoint_is_none() {
        let viewport = BBox::new(10.0, 10.0, 20.0, 20.0).unwrap();
        let region = BBox::new(-20.0, -20.0, -10.0, -10.0).unwrap();
        assert_eq!(viewport.clamp_to_region(&region), None);
    }

    #[test]
    fn clamp_to_region_clips() {
        let viewport = BBox::new(-10.0, -10.0, 10.0, 10.0).unwrap();
        let region = BBox::new(0.0, 0.0, 30.0, 30.0).unwrap();
        let clipped = viewport.clamp_to_region(&region).unwrap();
        assert_eq!(clipped, BBox::new(0.0, 0.0, 10.0, 10.0).unwrap());
    }

    #[test]
    fn margin_is_half_a_cell() {
        let zoom = 12;
        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let expanded = bbox.expand_by_margin(zoom);
        let margin = grid_size(zoom) / 2.0;
        assert!((bbox.west - expanded.west - margin).abs() < 1e-12);
        assert!((expanded.east - bbox.east - margin).abs() < 1e-12);
    }

    #[test]
    fn grid_cells_cover_snapped_box() {
        let zoom = 10;
        let bbox = BBox::from_center(zoom, 127.0, 37.5);
        let cells = bbox.grid_cells(zoom);
        assert_eq!(cells.len() as u64, bbox.cell_count(zoom));
        // Derived viewports span 2*3 cells horizontally and 2*2 vertically,
        // plus snapping may add one ring.
        assert!(cells.len() >= 24);
        for cell in &cells {
            let (lon, lat) = cell.center();
            assert!(bbox.contains(lon, lat));
        }
    }
}
