//! Zoom-dependent grid lattice over longitude/latitude.
//!
//! Every zoom level defines a fixed-size grid used to bucket photos for
//! clustering. Cell size halves with each zoom step, matching power-of-two
//! tile semantics: `grid_size(z) = BASE_GRID_DEG / 2^z`.

use serde::{Deserialize, Serialize};

/// Lowest zoom level served.
pub const MIN_ZOOM: u8 = 0;
/// Highest zoom level served.
pub const MAX_ZOOM: u8 = 22;

/// Angular width of a grid cell at the reference zoom (zoom 0), in degrees.
pub const BASE_GRID_DEG: f64 = 360.0;

/// Meters per degree of longitude at the equator.
pub const METERS_PER_DEG: f64 = 111_319.49;

/// Clamp a raw, UI-driven zoom value into the supported domain.
///
/// Zoom comes straight from clients and minor overshoot is expected, so
/// out-of-range input is clamped, never rejected.
#[inline]
pub fn clamp_zoom(zoom: i64) -> u8 {
    zoom.clamp(i64::from(MIN_ZOOM), i64::from(MAX_ZOOM)) as u8
}

/// Grid cell size in degrees at the given zoom. Pure and total over `[0, 22]`.
#[inline]
pub fn grid_size(zoom: u8) -> f64 {
    BASE_GRID_DEG / (1u64 << zoom.min(MAX_ZOOM)) as f64
}

/// Equatorial meter equivalent of [`grid_size`].
#[inline]
pub fn grid_size_meters(zoom: u8) -> f64 {
    grid_size(zoom) * METERS_PER_DEG
}

/// Zoom level together with its cell size, as passed to the read port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub zoom: u8,
    /// Cell size in degrees at `zoom`.
    pub cell_deg: f64,
}

impl GridSpec {
    pub fn at(zoom: u8) -> Self {
        Self {
            zoom,
            cell_deg: grid_size(zoom),
        }
    }
}

/// Integer lattice coordinates of one grid cell at a given zoom.
///
/// Invariant: `cell_x = floor(lon / grid_size(zoom))`, same for `cell_y`
/// over latitude. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub zoom: u8,
    pub cell_x: i64,
    pub cell_y: i64,
}

impl GridCell {
    pub fn new(zoom: u8, cell_x: i64, cell_y: i64) -> Self {
        Self {
            zoom,
            cell_x,
            cell_y,
        }
    }

    /// The cell containing the given point at the given zoom.
    pub fn containing(zoom: u8, lon: f64, lat: f64) -> Self {
        let size = grid_size(zoom);
        Self {
            zoom,
            cell_x: (lon / size).floor() as i64,
            cell_y: (lat / size).floor() as i64,
        }
    }

    /// West/south corner of the cell, in degrees.
    pub fn origin(&self) -> (f64, f64) {
        let size = grid_size(self.zoom);
        (self.cell_x as f64 * size, self.cell_y as f64 * size)
    }

    /// Geographic center of the cell.
    pub fn center(&self) -> (f64, f64) {
        let size = grid_size(self.zoom);
        let (west, south) = self.origin();
        (west + size / 2.0, south + size / 2.0)
    }

    /// Chebyshev distance on the cell lattice; 1 means directly adjacent.
    pub fn grid_steps_to(&self, other: &GridCell) -> i64 {
        (self.cell_x - other.cell_x)
            .abs()
            .max((self.cell_y - other.cell_y).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_halves_per_zoom_step() {
        for zoom in MIN_ZOOM..MAX_ZOOM {
            let coarse = grid_size(zoom);
            let fine = grid_size(zoom + 1);
            assert!((coarse / fine - 2.0).abs() < 1e-12, "zoom {zoom}");
        }
    }

    #[test]
    fn grid_size_at_reference_zoom() {
        assert_eq!(grid_size(0), BASE_GRID_DEG);
    }

    #[test]
    fn clamp_zoom_never_rejects() {
        assert_eq!(clamp_zoom(-5), MIN_ZOOM);
        assert_eq!(clamp_zoom(11), 11);
        assert_eq!(clamp_zoom(99), MAX_ZOOM);
    }

    #[test]
    fn containing_floors_toward_negative_infinity() {
        let size = grid_size(10);
        let cell = GridCell::containing(10, -size * 0.5, size * 1.5);
        assert_eq!(cell.cell_x, -1);
        assert_eq!(cell.cell_y, 1);
    }

    #[test]
    fn cell_center_lies_inside_cell() {
        let cell = GridCell::new(12, 1482, 431);
        let (lon, lat) = cell.center();
        assert_eq!(GridCell::containing(12, lon, lat), cell);
    }

    #[test]
    fn grid_steps_is_chebyshev() {
        let a = GridCell::new(11, 10, 10);
        let b = GridCell::new(11, 11, 8);
        assert_eq!(a.grid_steps_to(&b), 2);
        assert_eq!(a.grid_steps_to(&a), 0);
    }
}
