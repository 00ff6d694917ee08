use glam::{Vec2, Vec3};
use log::debug;

use crate::feature::{Feature, Geometry, Polygon};
use crate::height_field::{sample_elevation, HeightField};
use crate::mesh::{MeshFragment, Vertex};
use crate::params::{BuildParams, LayerPolicy};
use crate::tile::Tile;
use crate::triangulate::Triangulator;

const KEY_HEIGHT: &str = "height";
const KEY_MIN_HEIGHT: &str = "min_height";

/// `(min_height, height)` of a feature in tile units.
pub fn feature_heights(feature: &Feature, params: &BuildParams, tile: &Tile) -> (f32, f32) {
    let scale = tile.inv_scale * params.buildings_extrusion_scale as f64;

    let height = feature.number(KEY_HEIGHT).unwrap_or(0.0) * scale;
    let min_height = feature.number(KEY_MIN_HEIGHT).unwrap_or(0.0) * scale;

    (min_height as f32, height as f32)
}

/// Zero-height features are dropped on terrain tiles for layers that ask for it.
pub fn skipped_on_terrain(
    feature: &Feature,
    policy: LayerPolicy,
    params: &BuildParams,
    tile: &Tile,
    field: Option<&HeightField>,
) -> bool {
    if field.is_none() || !policy.skip_flat_on_terrain {
        return false;
    }

    let (_, height) = feature_heights(feature, params, tile);
    height == 0.0
}

/// Mean of every ring point.
fn centroid(polygon: &Polygon) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;

    for p in polygon.iter().flatten() {
        sum += p.truncate();
        count += 1;
    }

    if count == 0 {
        return Vec2::ZERO;
    }

    sum / count as f32
}

/// Flat roof at `height`, lifted by the terrain below the centroid.
pub fn build_cap(
    polygon: &Polygon,
    height: f32,
    centroid_elevation: f32,
    inv_scale: f32,
    tri: &dyn Triangulator,
    out: &mut MeshFragment,
) {
    let t = tri.triangulate(polygon);
    if t.is_empty() {
        return;
    }

    let z = height + centroid_elevation * inv_scale;
    let base = out.base_index();

    out.vertices.extend(
        t.vertices
            .iter()
            .map(|v| Vertex::new(v.extend(z), Vec3::Z)),
    );

    for tri in t.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let pa = t.vertices[a as usize];
        let pb = t.vertices[b as usize];
        let pc = t.vertices[c as usize];

        // Roof faces +Z: keep every triangle counter-clockwise seen from above.
        if (pb - pa).perp_dot(pc - pa) < 0.0 {
            out.indices.extend_from_slice(&[base + a, base + c, base + b]);
        } else {
            out.indices.extend_from_slice(&[base + a, base + b, base + c]);
        }
    }
}

/// Vertical walls from `min_height` to `height` along every ring edge.
///
/// Returns the terrain elevation at the polygon centroid, which the roof
/// uses too. Walls start at the lowest terrain point under the ring so
/// buildings on slopes do not float.
pub fn build_walls(
    polygon: &Polygon,
    min_height: f32,
    height: f32,
    field: Option<&HeightField>,
    inv_scale: f32,
    out: &mut MeshFragment,
) -> f32 {
    let cz = sample_elevation(centroid(polygon), field);

    if min_height == height {
        return cz;
    }

    let minz = match field {
        Some(f) => polygon
            .iter()
            .flatten()
            .map(|p| f.sample(p.truncate()))
            .fold(f32::INFINITY, f32::min),
        None => 0.0,
    };
    let minz = if minz.is_finite() { minz } else { 0.0 };

    let top = height + cz * inv_scale;
    let bottom = min_height + minz * inv_scale;

    for ring in polygon {
        for edge in ring.windows(2) {
            let a = edge[0].truncate();
            let b = edge[1].truncate();

            if a == b {
                continue;
            }

            let normal = Vec3::Z.cross((b - a).extend(0.0)).normalize_or_zero();
            let base = out.base_index();

            out.vertices.extend_from_slice(&[
                Vertex::new(a.extend(top), normal),
                Vertex::new(b.extend(top), normal),
                Vertex::new(a.extend(bottom), normal),
                Vertex::new(b.extend(bottom), normal),
            ]);

            out.indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base + 1,
                base + 3,
                base + 2,
            ]);
        }
    }

    cz
}

/// Extrude every polygon of a feature into a block with walls and a roof.
pub fn build_polygon_feature(
    feature: &Feature,
    policy: LayerPolicy,
    params: &BuildParams,
    tile: &Tile,
    field: Option<&HeightField>,
    tri: &dyn Triangulator,
) -> Option<MeshFragment> {
    if !params.buildings {
        return None;
    }

    let Geometry::Polygons(polygons) = &feature.geometry else {
        return None;
    };

    if skipped_on_terrain(feature, policy, params, tile, field) {
        debug!("tile {}: skipping flat feature on terrain", tile.id);
        return None;
    }

    let (min_height, height) = feature_heights(feature, params, tile);
    let inv_scale = tile.inv_scale_f32();

    let mut mesh = MeshFragment::new();

    for polygon in polygons {
        let cz = build_walls(polygon, min_height, height, field, inv_scale, &mut mesh);
        build_cap(polygon, height, cz, inv_scale, tri, &mut mesh);
    }

    (!mesh.is_empty()).then_some(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::PropertyValue;
    use crate::tile::TileId;
    use crate::triangulate::Earcut;

    fn closed_square() -> Polygon {
        // Clockwise, closed.
        vec![vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(-0.5, -0.5, 0.0),
        ]]
    }

    fn flat_field(value: f32) -> HeightField {
        HeightField::new(4, 4, vec![value; 16]).unwrap()
    }

    #[test]
    fn test_square_block_counts() {
        let mut mesh = MeshFragment::new();
        let square = closed_square();

        let cz = build_walls(&square, 0.0, 0.2, None, 1.0, &mut mesh);
        assert_eq!(cz, 0.0);
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.triangle_count(), 8);

        build_cap(&square, 0.2, cz, 1.0, &Earcut, &mut mesh);
        assert_eq!(mesh.vertices.len(), 20);
        assert_eq!(mesh.triangle_count(), 10);

        for v in &mesh.vertices[16..] {
            assert!((v.position.z - 0.2).abs() < 1e-6);
            assert_eq!(v.normal, Vec3::Z);
        }
        assert!(mesh.indices[24..].iter().all(|&i| i >= 16));
    }

    #[test]
    fn test_wall_normals_face_outward_for_clockwise_ring() {
        let mut mesh = MeshFragment::new();
        build_walls(&closed_square(), 0.0, 1.0, None, 1.0, &mut mesh);

        // First edge runs (-0.5,-0.5) -> (-0.5,0.5): the western wall.
        assert!((mesh.vertices[0].normal - Vec3::NEG_X).length() < 1e-6);
        for quad in mesh.vertices.chunks_exact(4) {
            let mid = (quad[0].position + quad[1].position).truncate() * 0.5;
            assert!(mid.dot(quad[0].normal.truncate()) > 0.0);
        }
    }

    #[test]
    fn test_cap_faces_up() {
        let mut mesh = MeshFragment::new();
        build_cap(&closed_square(), 0.0, 0.0, 1.0, &Earcut, &mut mesh);

        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.vertices[tri[0] as usize].position;
            let b = mesh.vertices[tri[1] as usize].position;
            let c = mesh.vertices[tri[2] as usize].position;
            assert!((b - a).cross(c - a).z > 0.0);
        }
    }

    #[test]
    fn test_flat_polygon_has_no_walls() {
        let mut mesh = MeshFragment::new();
        let square = closed_square();

        let cz = build_walls(&square, 0.0, 0.0, None, 1.0, &mut mesh);
        assert!(mesh.vertices.is_empty());

        build_cap(&square, 0.0, cz, 1.0, &Earcut, &mut mesh);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_repeated_ring_point_is_skipped() {
        let mut square = closed_square();
        let p = square[0][1];
        square[0].insert(1, p);

        let mut mesh = MeshFragment::new();
        build_walls(&square, 0.0, 1.0, None, 1.0, &mut mesh);

        assert_eq!(mesh.vertices.len(), 16);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.normal.is_finite() && v.position.is_finite()));
    }

    #[test]
    fn test_terrain_lifts_roof_and_lowers_base() {
        let field = flat_field(10.0);
        let mut mesh = MeshFragment::new();

        let cz = build_walls(&closed_square(), 0.0, 1.0, Some(&field), 0.5, &mut mesh);
        assert!((cz - 10.0).abs() < 1e-5);

        // top = 1 + 10 * 0.5, bottom = 0 + 10 * 0.5
        assert!((mesh.vertices[0].position.z - 6.0).abs() < 1e-5);
        assert!((mesh.vertices[2].position.z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_feature_on_terrain_policy() {
        let tile = Tile::new(TileId::new(19294, 24642, 16));
        let params = BuildParams::default();
        let field = flat_field(0.0);

        let flat = Feature::new(Geometry::Polygons(vec![closed_square()]));
        let buildings = params.policy("buildings");

        assert!(build_polygon_feature(&flat, buildings, &params, &tile, Some(&field), &Earcut)
            .is_none());
        assert!(build_polygon_feature(&flat, buildings, &params, &tile, None, &Earcut).is_some());

        let keep = LayerPolicy {
            render_on_terrain: true,
            skip_flat_on_terrain: false,
        };
        assert!(
            build_polygon_feature(&flat, keep, &params, &tile, Some(&field), &Earcut).is_some()
        );

        let tall = flat
            .clone()
            .with_prop("height", PropertyValue::Number(30.0));
        let mesh =
            build_polygon_feature(&tall, buildings, &params, &tile, Some(&field), &Earcut).unwrap();
        assert_eq!(mesh.vertices.len(), 20);

        let expected = (30.0 * tile.inv_scale) as f32;
        assert!((mesh.vertices[0].position.z - expected).abs() < 1e-6);
    }

    #[test]
    fn test_buildings_disabled() {
        let tile = Tile::new(TileId::new(1, 1, 2));
        let params = BuildParams {
            buildings: false,
            ..BuildParams::default()
        };
        let f = Feature::new(Geometry::Polygons(vec![closed_square()]));

        assert!(build_polygon_feature(&f, LayerPolicy::HIDDEN, &params, &tile, None, &Earcut)
            .is_none());
    }
}
