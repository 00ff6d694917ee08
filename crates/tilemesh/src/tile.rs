use glam::{DVec2, Vec2};
use std::fmt;

use crate::projection::{tile_bounds, TILE_SIZE};
use crate::{Error, Result};

/// Deepest zoom whose tile coordinates still fit a `u32` grid.
pub const MAX_ZOOM: u32 = 31;

/// Pyramid address of a tile; the lookup key for per-tile data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl TileId {
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Neighbour one column east (x + 1).
    #[inline]
    pub fn right(self) -> Self {
        Self::new(self.x + 1, self.y, self.z)
    }

    /// Neighbour one row south (y + 1, rows grow downward).
    #[inline]
    pub fn down(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Which sides of a tile lie on the outer edge of the requested rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Borders {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub id: TileId,
    /// World meters -> tile-local [-1, 1].
    pub inv_scale: f64,
    /// Tile center in world meters, y pointing north.
    pub origin: DVec2,
    pub borders: Borders,
}

impl Tile {
    pub fn new(id: TileId) -> Self {
        let bounds = tile_bounds(id.x, id.y, id.z, TILE_SIZE);

        // Pixel rows grow southward, so the pixel-space center has its y
        // negated to land in the same frame as `lon_lat_to_meters`.
        let center = bounds.center();
        let origin = DVec2::new(center.x, -center.y);

        Self {
            id,
            inv_scale: bounds.inv_scale(),
            origin,
            borders: Borders::default(),
        }
    }

    pub fn with_borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    /// Project world meters into this tile's local frame.
    #[inline]
    pub fn to_local(&self, meters: DVec2) -> Vec2 {
        ((meters - self.origin) * self.inv_scale).as_vec2()
    }

    #[inline]
    pub fn inv_scale_f32(&self) -> f32 {
        self.inv_scale as f32
    }
}

/// Inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
    pub z: u32,
}

impl TileRange {
    /// Parse axes of the form `N` or `A/B` (inclusive, `A <= B`).
    pub fn parse(x: &str, y: &str, z: u32) -> Result<Self> {
        if z > MAX_ZOOM {
            return Err(Error::InvalidZoom(z));
        }

        let (x_start, x_end) = parse_axis(x, z)?;
        let (y_start, y_end) = parse_axis(y, z)?;

        Ok(Self {
            x_start,
            x_end,
            y_start,
            y_end,
            z,
        })
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }

        let w = (self.x_end - self.x_start) as usize + 1;
        let h = (self.y_end - self.y_start) as usize + 1;
        w.saturating_mul(h)
    }

    pub fn is_empty(&self) -> bool {
        self.x_end < self.x_start || self.y_end < self.y_start
    }

    /// All tiles, x-major then y; the first one is the scene origin.
    pub fn tiles(&self) -> Result<Vec<Tile>> {
        if self.is_empty() {
            return Err(Error::EmptyTileRange);
        }

        let mut tiles = Vec::with_capacity(self.len());

        for x in self.x_start..=self.x_end {
            for y in self.y_start..=self.y_end {
                let borders = Borders {
                    left: x == self.x_start,
                    right: x == self.x_end,
                    top: y == self.y_start,
                    bottom: y == self.y_end,
                };

                tiles.push(Tile::new(TileId::new(x, y, self.z)).with_borders(borders));
            }
        }

        Ok(tiles)
    }
}

fn parse_axis(axis: &str, z: u32) -> Result<(u32, u32)> {
    let bad = || Error::InvalidTileRange(axis.to_string());

    let parts: Vec<&str> = axis.split('/').map(str::trim).collect();

    let (start, end) = match parts.as_slice() {
        [one] => {
            let v = one.parse::<u32>().map_err(|_| bad())?;
            (v, v)
        }
        [a, b] => (
            a.parse::<u32>().map_err(|_| bad())?,
            b.parse::<u32>().map_err(|_| bad())?,
        ),
        _ => return Err(bad()),
    };

    // A zoom-z grid is 2^z tiles wide.
    if end < start || u64::from(end) >= 1u64 << z {
        return Err(bad());
    }

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_range() {
        let r = TileRange::parse("19294", "24642/24643", 16).unwrap();
        assert_eq!((r.x_start, r.x_end), (19294, 19294));
        assert_eq!((r.y_start, r.y_end), (24642, 24643));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_parse_rejects_reversed_and_garbage() {
        assert!(matches!(
            TileRange::parse("5/4", "1", 3),
            Err(Error::InvalidTileRange(_))
        ));
        assert!(TileRange::parse("1/2/3", "1", 3).is_err());
        assert!(TileRange::parse("x", "1", 3).is_err());
        assert!(TileRange::parse("", "1", 3).is_err());
    }

    #[test]
    fn test_parse_rejects_zoom_past_limit() {
        assert!(TileRange::parse("0", "0", MAX_ZOOM).is_ok());
        assert!(matches!(
            TileRange::parse("0", "0", 32),
            Err(Error::InvalidZoom(32))
        ));
        assert!(matches!(
            TileRange::parse("0", "0", 64),
            Err(Error::InvalidZoom(64))
        ));
    }

    #[test]
    fn test_parse_rejects_tiles_outside_grid() {
        assert!(TileRange::parse("3", "0/3", 2).is_ok());
        assert!(matches!(
            TileRange::parse("4", "0", 2),
            Err(Error::InvalidTileRange(_))
        ));
        assert!(TileRange::parse("0", "2/4", 2).is_err());
    }

    #[test]
    fn test_len_at_coordinate_limit() {
        let r = TileRange {
            x_start: u32::MAX - 1,
            x_end: u32::MAX,
            y_start: 7,
            y_end: 7,
            z: MAX_ZOOM,
        };
        assert_eq!(r.len(), 2);

        let full = TileRange {
            x_start: 0,
            x_end: u32::MAX,
            y_start: 0,
            y_end: 0,
            z: MAX_ZOOM,
        };
        assert_eq!(full.len(), u32::MAX as usize + 1);
    }

    #[test]
    fn test_tiles_order_and_borders() {
        let r = TileRange::parse("10/12", "20/21", 5).unwrap();
        let tiles = r.tiles().unwrap();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0].id, TileId::new(10, 20, 5));
        assert_eq!(tiles[1].id, TileId::new(10, 21, 5));
        assert_eq!(tiles[2].id, TileId::new(11, 20, 5));

        let first = tiles[0].borders;
        assert!(first.left && first.top && !first.right && !first.bottom);

        let middle = tiles[2].borders;
        assert!(!middle.left && !middle.right && middle.top && !middle.bottom);

        let last = tiles[5].borders;
        assert!(last.right && last.bottom && !last.left && !last.top);
    }

    #[test]
    fn test_single_tile_has_all_borders() {
        let tiles = TileRange::parse("3", "4", 4).unwrap().tiles().unwrap();
        assert_eq!(tiles.len(), 1);
        let b = tiles[0].borders;
        assert!(b.left && b.right && b.top && b.bottom);
    }

    #[test]
    fn test_empty_range_is_fatal() {
        let r = TileRange {
            x_start: 2,
            x_end: 1,
            y_start: 0,
            y_end: 0,
            z: 1,
        };
        assert!(matches!(r.tiles(), Err(Error::EmptyTileRange)));
    }

    #[test]
    fn test_tile_center_maps_to_local_origin() {
        let tile = Tile::new(TileId::new(19294, 24642, 16));
        let local = tile.to_local(tile.origin);
        assert!(local.length() < 1e-6);
        assert!(tile.inv_scale > 0.0);
    }

    #[test]
    fn test_local_coordinates_follow_north_up() {
        use crate::projection::lon_lat_to_meters;

        // Zoom 1, tile (0, 0) is the north-west quadrant.
        let tile = Tile::new(TileId::new(0, 0, 1));
        let nw = tile.to_local(lon_lat_to_meters(-179.9, 85.0));
        let center = tile.to_local(lon_lat_to_meters(-90.0, 66.5));
        assert!(nw.x < -0.9 && nw.y > 0.9);
        assert!(center.x.abs() < 1e-3);
        assert!(center.y > -1.0 && center.y < 1.0);
    }
}
