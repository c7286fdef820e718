//! Planar projections used by the merge strategies.
//!
//! Both projections are spherical Web-Mercator. Meter coordinates feed the
//! distance strategy; world-pixel coordinates (256-px tiles) feed the pixel
//! strategy, which supports fractional zoom.

use std::f64::consts::PI;

/// WGS84 equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude bound of the Mercator projection.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Pixel edge length of one map tile.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Project a point to planar Web-Mercator meters.
pub fn lonlat_to_mercator_m(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Planar distance between two points in meters.
pub fn mercator_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Project a point to world-pixel coordinates at the given zoom.
///
/// Zoom may be fractional; the world is `256 * 2^zoom` pixels wide. Pixel y
/// grows southward, matching screen coordinates.
pub fn lonlat_to_world_px(lon: f64, lat: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE_PX * zoom.exp2();
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lat_rad = lat.to_radians();
    let x = (lon + 180.0) / 360.0 * scale;
    let y = (1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln()) / PI) / 2.0 * scale;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mercator_origin_is_zero() {
        let (x, y) = lonlat_to_mercator_m(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn mercator_meters_scale_with_longitude() {
        // One degree of longitude at the equator is about 111.3 km.
        let (x, _) = lonlat_to_mercator_m(1.0, 0.0);
        assert!((x - 111_319.49).abs() < 1.0);
    }

    #[test]
    fn extreme_latitudes_are_clamped() {
        let (_, y_pole) = lonlat_to_mercator_m(0.0, 90.0);
        let (_, y_limit) = lonlat_to_mercator_m(0.0, MAX_MERCATOR_LAT);
        assert_eq!(y_pole, y_limit);
        assert!(y_pole.is_finite());
    }

    #[test]
    fn world_px_spans_the_world() {
        let (x_w, _) = lonlat_to_world_px(-180.0, 0.0, 3.0);
        let (x_e, _) = lonlat_to_world_px(180.0, 0.0, 3.0);
        assert!(x_w.abs() < 1e-9);
        assert!((x_e - 256.0 * 8.0).abs() < 1e-9);
    }

    #[test]
    fn world_px_y_grows_southward() {
        let (_, y_north) = lonlat_to_world_px(0.0, 40.0, 10.0);
        let (_, y_south) = lonlat_to_world_px(0.0, -40.0, 10.0);
        assert!(y_north < y_south);
    }
}
