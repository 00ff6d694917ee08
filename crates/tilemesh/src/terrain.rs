use glam::{Vec2, Vec3};

use crate::height_field::HeightField;
use crate::mesh::{MeshFragment, Vertex};
use crate::params::BuildParams;
use crate::tile::Tile;

/// Grid of `nw x nh` quads centred on the origin, 4 vertices per quad.
///
/// `flip` turns the plane upside down (normal `-Z`, reversed winding).
pub fn build_plane(width: f32, height: f32, nw: u32, nh: u32, flip: bool) -> MeshFragment {
    let mut mesh = MeshFragment::new();
    if nw == 0 || nh == 0 {
        return mesh;
    }

    let quads = (nw * nh) as usize;
    mesh.vertices.reserve(quads * 4);
    mesh.indices.reserve(quads * 6);

    let ow = width / nw as f32;
    let oh = height / nh as f32;
    let normal = if flip { Vec3::NEG_Z } else { Vec3::Z };

    for i in 0..nw {
        let w = -0.5 * width + i as f32 * ow;

        for j in 0..nh {
            let h = -0.5 * height + j as f32 * oh;
            let base = mesh.base_index();

            mesh.vertices.extend_from_slice(&[
                Vertex::new(Vec3::new(w, h + oh, 0.0), normal),
                Vertex::new(Vec3::new(w, h, 0.0), normal),
                Vertex::new(Vec3::new(w + ow, h, 0.0), normal),
                Vertex::new(Vec3::new(w + ow, h + oh, 0.0), normal),
            ]);

            if flip {
                mesh.indices
                    .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
            } else {
                mesh.indices
                    .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }
    }

    mesh
}

/// Terrain surface of one tile: a `2 x 2` plane displaced by the height field.
pub fn build_terrain(tile: &Tile, field: &HeightField, params: &BuildParams) -> MeshFragment {
    let n = params.terrain_subdivision.max(1);
    let mut mesh = build_plane(2.0, 2.0, n, n, false);
    let inv_scale = tile.inv_scale_f32();

    for v in &mut mesh.vertices {
        v.position.z = field.sample(v.position.truncate()) * inv_scale;
    }

    // Vertices are per quad, so smoothing never crosses a quad boundary.
    if params.normals {
        mesh.compute_normals();
    }

    mesh
}

/// One side of the tile square, walked in increasing x or y.
#[derive(Debug, Clone, Copy)]
enum Side {
    Right,
    Bottom,
    Left,
    Top,
}

impl Side {
    /// Point on this side at parameter `t` in `[-1, 1]`.
    fn point(self, t: f32) -> Vec2 {
        match self {
            Side::Right => Vec2::new(1.0, t),
            Side::Left => Vec2::new(-1.0, t),
            Side::Bottom => Vec2::new(t, -1.0),
            Side::Top => Vec2::new(t, 1.0),
        }
    }

    fn normal(self) -> Vec3 {
        match self {
            Side::Right => Vec3::X,
            Side::Left => Vec3::NEG_X,
            Side::Bottom => Vec3::NEG_Y,
            Side::Top => Vec3::Y,
        }
    }

    /// Right and bottom share a winding; left and top use the mirrored one.
    fn indices(self, base: u32) -> [u32; 6] {
        match self {
            Side::Right | Side::Bottom => [base, base + 2, base + 1, base + 1, base + 2, base + 3],
            Side::Left | Side::Top => [base, base + 1, base + 2, base + 1, base + 3, base + 2],
        }
    }
}

/// Skirt walls along the outer borders of the range plus a floor underneath.
pub fn build_pedestal(tile: &Tile, field: &HeightField, params: &BuildParams) -> MeshFragment {
    let n = params.terrain_subdivision.max(1);
    let inv_scale = tile.inv_scale_f32();
    let bottom = params.pedestal_height * inv_scale;
    // Local span is 2 units, so each step is 1/n of the tile edge.
    let step = 2.0 / n as f32;

    let borders = tile.borders;
    let sides = [
        (borders.right, Side::Right),
        (borders.bottom, Side::Bottom),
        (borders.left, Side::Left),
        (borders.top, Side::Top),
    ];

    let mut mesh = MeshFragment::new();

    for side in sides.into_iter().filter_map(|(on, side)| on.then_some(side)) {
        let normal = side.normal();

        for k in 0..n {
            let p0 = side.point(-1.0 + k as f32 * step);
            let p1 = side.point(-1.0 + (k + 1) as f32 * step);

            let z0 = field.sample(p0) * inv_scale;
            let z1 = field.sample(p1) * inv_scale;
            let base = mesh.base_index();

            mesh.vertices.extend_from_slice(&[
                Vertex::new(p0.extend(z0), normal),
                Vertex::new(p1.extend(z1), normal),
                Vertex::new(p0.extend(bottom), normal),
                Vertex::new(p1.extend(bottom), normal),
            ]);
            mesh.indices.extend_from_slice(&side.indices(base));
        }
    }

    let mut floor = build_plane(2.0, 2.0, 1, 1, true);
    for v in &mut floor.vertices {
        v.position.z = bottom;
    }
    mesh.append(floor);

    mesh
}
