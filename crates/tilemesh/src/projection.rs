//! Spherical web mercator helpers (EPSG:3857).

use glam::DVec2;
use std::f64::consts::PI;

/// Earth radius used by the spherical projection, in meters.
pub const R_EARTH: f64 = 6_378_137.0;

/// Half of the equatorial circumference (π·R), in meters.
pub const HALF_CIRCUMFERENCE: f64 = PI * R_EARTH;

/// Tile edge length in pixels used to derive tile bounds.
pub const TILE_SIZE: f64 = 256.0;

/// World-meter rectangle covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl TileBounds {
    /// Factor mapping world meters onto the tile's [-1, 1] span.
    #[inline]
    pub fn inv_scale(&self) -> f64 {
        1.0 / (0.5 * (self.max.x - self.min.x).abs())
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        0.5 * (self.min + self.max)
    }
}

/// Project longitude/latitude (degrees) to planar meters.
///
/// Latitude must stay within the mercator range (about ±85.05°); outside of
/// it the result is meaningless but finite inputs never panic.
#[inline]
pub fn lon_lat_to_meters(lon: f64, lat: f64) -> DVec2 {
    let x = lon * HALF_CIRCUMFERENCE / 180.0;
    let y = (PI * 0.25 + lat * PI / 360.0).tan().ln() * R_EARTH;

    DVec2::new(x, y)
}

/// Pixel coordinates at `zoom` to meters, measured from the top-left corner
/// of the projected world (y grows downward like the pixel rows).
#[inline]
pub fn pixels_to_meters(pix: DVec2, zoom: u32, inv_tile_size: f64) -> DVec2 {
    let res = (2.0 * HALF_CIRCUMFERENCE * inv_tile_size) / f64::from(zoom).exp2();

    DVec2::new(
        pix.x * res - HALF_CIRCUMFERENCE,
        pix.y * res - HALF_CIRCUMFERENCE,
    )
}

pub fn tile_bounds(x: u32, y: u32, zoom: u32, tile_size: f64) -> TileBounds {
    let inv = 1.0 / tile_size;

    TileBounds {
        min: pixels_to_meters(
            DVec2::new(x as f64 * tile_size, y as f64 * tile_size),
            zoom,
            inv,
        ),
        max: pixels_to_meters(
            DVec2::new((x as f64 + 1.0) * tile_size, (y as f64 + 1.0) * tile_size),
            zoom,
            inv,
        ),
    }
}
