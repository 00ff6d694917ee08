use glam::Vec2;
use log::debug;
use std::collections::HashMap;

use crate::tile::TileId;

/// Row-major grid of elevations in meters (extrusion scale already applied).
///
/// Row 0 is the northern edge of the tile, column 0 the western edge.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl HeightField {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return None;
        }

        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Decode a "terrarium" RGBA raster: `r * 256 + g + b / 256 - 32768`.
    ///
    /// Only 4-channel 8-bit buffers are accepted; anything else means the
    /// terrain is absent for this tile.
    pub fn from_rgba(
        width: usize,
        height: usize,
        channels: usize,
        pixels: &[u8],
        extrusion_scale: f32,
    ) -> Option<Self> {
        if channels != 4 {
            debug!("terrain raster has {channels} channels, expected 4");
            return None;
        }

        if width == 0 || height == 0 || pixels.len() != width * height * 4 {
            return None;
        }

        let data = pixels
            .chunks_exact(4)
            .map(|px| {
                let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
                (r * 256.0 + g + b / 256.0 - 32768.0) * extrusion_scale
            })
            .collect();

        Self::new(width, height, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    fn set(&mut self, col: usize, row: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    /// Bilinear elevation at a tile-local position, clamped to the tile.
    pub fn sample(&self, pos: Vec2) -> f32 {
        let p = pos.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));

        let w = self.width as f32;
        let h = self.height as f32;

        let u = (p.x * 0.5 + 0.5) * w;
        let v = h - (p.y * 0.5 + 0.5) * h;

        let (c0, c1, tu) = texel_span(u, self.width);
        let (r0, r1, tv) = texel_span(v, self.height);

        let top = lerp(self.get(c0, r0), self.get(c1, r0), tu);
        let bottom = lerp(self.get(c0, r1), self.get(c1, r1), tu);

        lerp(top, bottom, tv)
    }

    /// Column `col` averaged with `other`'s column `other_col`, written to both.
    fn average_columns(&mut self, col: usize, other: &mut HeightField, other_col: usize) {
        for row in 0..self.height.min(other.height) {
            let avg = 0.5 * (self.get(col, row) + other.get(other_col, row));
            self.set(col, row, avg);
            other.set(other_col, row, avg);
        }
    }

    fn average_rows(&mut self, row: usize, other: &mut HeightField, other_row: usize) {
        for col in 0..self.width.min(other.width) {
            let avg = 0.5 * (self.get(col, row) + other.get(col, other_row));
            self.set(col, row, avg);
            other.set(col, other_row, avg);
        }
    }
}

/// Lower/upper texel index and blend factor along one axis.
#[inline]
fn texel_span(coord: f32, len: usize) -> (usize, usize, f32) {
    let last = len as isize - 1;
    let base = coord.floor();
    let i0 = (base as isize).clamp(0, last) as usize;
    let i1 = (i0 as isize + 1).min(last) as usize;

    (i0, i1, coord - base)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Elevation at `pos`, or 0 when the tile has no terrain.
#[inline]
pub fn sample_elevation(pos: Vec2, field: Option<&HeightField>) -> f32 {
    field.map_or(0.0, |f| f.sample(pos))
}

/// Make shared edges of adjacent tiles identical.
///
/// Each tile is paired with its east neighbour `(x + 1, y)` and its south
/// neighbour `(x, y + 1)`; the touching column/row of both grids is replaced
/// by the average. Every adjacent pair is visited once.
///
/// Corner samples where up to four tiles meet are set afterwards to the mean
/// of their values before stitching, so all tiles agree on them.
pub fn stitch_edges(fields: &mut HashMap<TileId, HeightField>) {
    let junctions = corner_junctions(fields);

    let mut ids: Vec<TileId> = fields.keys().copied().collect();
    ids.sort();

    let mut seams = 0usize;

    for id in ids {
        for (neighbour_id, east) in [(id.right(), true), (id.down(), false)] {
            // Take the neighbour out so both grids can be borrowed mutably.
            let Some(mut neighbour) = fields.remove(&neighbour_id) else {
                continue;
            };

            if let Some(current) = fields.get_mut(&id) {
                if east {
                    let last = current.width - 1;
                    current.average_columns(last, &mut neighbour, 0);
                } else {
                    let last = current.height - 1;
                    current.average_rows(last, &mut neighbour, 0);
                }
                seams += 1;
            }

            fields.insert(neighbour_id, neighbour);
        }
    }

    let mut corners = 0usize;

    for samples in junctions.values().filter(|s| s.len() > 1) {
        let mean = samples.iter().map(|s| s.value).sum::<f32>() / samples.len() as f32;

        for s in samples {
            if let Some(field) = fields.get_mut(&s.id) {
                field.set(s.col, s.row, mean);
            }
        }
        corners += 1;
    }

    debug!("stitched {seams} terrain seams, {corners} corners");
}

/// One tile's corner sample, captured before stitching.
struct CornerSample {
    id: TileId,
    col: usize,
    row: usize,
    value: f32,
}

/// Group tile corners by the lattice point they sit on.
///
/// Tile `(x, y)` spans lattice points `(x, y)` to `(x + 1, y + 1)`.
fn corner_junctions(
    fields: &HashMap<TileId, HeightField>,
) -> HashMap<(u32, u64, u64), Vec<CornerSample>> {
    let mut junctions: HashMap<_, Vec<CornerSample>> = HashMap::new();

    for (&id, field) in fields {
        let (last_col, last_row) = (field.width - 1, field.height - 1);
        let (x, y) = (u64::from(id.x), u64::from(id.y));

        for (dx, dy, col, row) in [
            (0, 0, 0, 0),
            (1, 0, last_col, 0),
            (0, 1, 0, last_row),
            (1, 1, last_col, last_row),
        ] {
            junctions
                .entry((id.z, x + dx, y + dy))
                .or_default()
                .push(CornerSample {
                    id,
                    col,
                    row,
                    value: field.get(col, row),
                });
        }
    }

    junctions
}
