//! Deterministic tile cache keys.
//!
//! Keys are built from quantized inputs so that near-identical viewports
//! from panning and zooming collapse onto the same entry, and they embed
//! the owning scope's version so invalidation is a counter bump rather
//! than a key scan. Parse functions are the strict inverse of the build
//! functions; malformed keys are rejected, never guessed at.
//!
//! Literal formats (bit-exact, relied on by interop tests):
//!
//! - cell keys:     `z{zoom}_x{cellX}_y{cellY}_c{scopeA}_a{scopeB}_v{version}`
//! - viewport keys: `ind_z{zoomBand}_w{west*1e6}_s{south*1e6}_e{east*1e6}_n{north*1e6}_c{scopeA}_a{scopeB}_v{version}`
//!
//! Absent scope ids normalize to `0`.

use once_cell::sync::Lazy;
use regex::Regex;

use photomap_core::{BBox, MapError, MapResult, MAX_ZOOM};

static CELL_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^z(\d{1,2})_x(-?\d+)_y(-?\d+)_c(-?\d+)_a(-?\d+)_v(\d+)$")
        .expect("cell key pattern is valid")
});

static VIEWPORT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ind_z(\d{1,2})_w(-?\d+)_s(-?\d+)_e(-?\d+)_n(-?\d+)_c(-?\d+)_a(-?\d+)_v(\d+)$")
        .expect("viewport key pattern is valid")
});

/// Decoded cell cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub zoom: u8,
    pub cell_x: i64,
    pub cell_y: i64,
    pub collection_id: i64,
    pub album_id: i64,
    pub version: u64,
}

/// Decoded viewport cache key. Edges are stored as quantized microdegrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportKey {
    pub zoom_band: u8,
    pub west_e6: i64,
    pub south_e6: i64,
    pub east_e6: i64,
    pub north_e6: i64,
    pub collection_id: i64,
    pub album_id: i64,
    pub version: u64,
}

/// Decimal precision of viewport quantization per zoom: coarse while the
/// map shows whole regions, fine once individual streets are visible.
fn precision_decimals(zoom: u8) -> i32 {
    match zoom {
        0..=9 => 2,
        10..=13 => 3,
        _ => 4,
    }
}

/// Floor to `decimals` places, expressed as integer microdegrees.
///
/// Works on the integer microdegree representation so repeated
/// quantization is a fixed point; floating-point flooring of values
/// like `0.29 * 100` drifts below the true boundary.
fn quantize_e6(value: f64, decimals: i32) -> i64 {
    let e6 = (value * 1e6).round() as i64;
    let step = 10i64.pow((6 - decimals) as u32);
    e6.div_euclid(step) * step
}

pub fn build_cell_key(
    zoom: u8,
    cell_x: i64,
    cell_y: i64,
    collection_id: i64,
    album_id: i64,
    version: u64,
) -> String {
    format!("z{zoom}_x{cell_x}_y{cell_y}_c{collection_id}_a{album_id}_v{version}")
}

pub fn parse_cell_key(key: &str) -> MapResult<CellKey> {
    let caps = CELL_KEY_RE
        .captures(key)
        .ok_or_else(|| MapError::malformed_cache_key(key, "not a cell key"))?;
    let zoom: u8 = caps[1]
        .parse()
        .map_err(|_| MapError::malformed_cache_key(key, "invalid zoom"))?;
    if zoom > MAX_ZOOM {
        return Err(MapError::malformed_cache_key(key, "zoom out of range"));
    }
    let field = |i: usize, what: &str| -> MapResult<i64> {
        caps[i]
            .parse()
            .map_err(|_| MapError::malformed_cache_key(key, what))
    };
    Ok(CellKey {
        zoom,
        cell_x: field(2, "invalid cell x")?,
        cell_y: field(3, "invalid cell y")?,
        collection_id: field(4, "invalid collection id")?,
        album_id: field(5, "invalid album id")?,
        version: caps[6]
            .parse()
            .map_err(|_| MapError::malformed_cache_key(key, "invalid version"))?,
    })
}

pub fn build_viewport_key(
    zoom: u8,
    bbox: &BBox,
    collection_id: i64,
    album_id: i64,
    version: u64,
) -> String {
    let decimals = precision_decimals(zoom);
    format!(
        "ind_z{zoom}_w{}_s{}_e{}_n{}_c{collection_id}_a{album_id}_v{version}",
        quantize_e6(bbox.west, decimals),
        quantize_e6(bbox.south, decimals),
        quantize_e6(bbox.east, decimals),
        quantize_e6(bbox.north, decimals),
    )
}

pub fn parse_viewport_key(key: &str) -> MapResult<ViewportKey> {
    let caps = VIEWPORT_KEY_RE
        .captures(key)
        .ok_or_else(|| MapError::malformed_cache_key(key, "not a viewport key"))?;
    let zoom_band: u8 = caps[1]
        .parse()
        .map_err(|_| MapError::malformed_cache_key(key, "invalid zoom band"))?;
    if zoom_band > MAX_ZOOM {
        return Err(MapError::malformed_cache_key(key, "zoom out of range"));
    }
    let field = |i: usize, what: &str| -> MapResult<i64> {
        caps[i]
            .parse()
            .map_err(|_| MapError::malformed_cache_key(key, what))
    };
    Ok(ViewportKey {
        zoom_band,
        west_e6: field(2, "invalid west edge")?,
        south_e6: field(3, "invalid south edge")?,
        east_e6: field(4, "invalid east edge")?,
        north_e6: field(5, "invalid north edge")?,
        collection_id: field(6, "invalid collection id")?,
        album_id: field(7, "invalid album id")?,
        version: caps[8]
            .parse()
            .map_err(|_| MapError::malformed_cache_key(key, "invalid version"))?,
    })
}
