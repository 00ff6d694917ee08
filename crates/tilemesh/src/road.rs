use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

use crate::feature::{Feature, Geometry, Line, Polygon};
use crate::height_field::HeightField;
use crate::mesh::MeshFragment;
use crate::params::{BuildParams, LayerPolicy};
use crate::polygon::{build_cap, build_walls, skipped_on_terrain};
use crate::tile::Tile;
use crate::triangulate::Triangulator;

const MITER_EPSILON: f32 = 1e-5;

/// Unit left normal of a 2D direction.
#[inline]
fn perp(v: Vec2) -> Vec2 {
    v.perp().normalize_or_zero()
}

/// Offset points contributed by one pass over the interior vertices.
///
/// Right turns get a single miter point on the inner side; left turns get
/// two bevel points. The pass starts with the end cap at `points[0]`.
fn offset_pass(points: &[Vec2], extrude: f32, out: &mut Vec<Vec2>) {
    let mut last = points[0];

    for i in 1..points.len() - 1 {
        let current = points[i];
        let next = points[i + 1];

        let n0 = perp(current - last);
        let n1 = perp(next - current);
        let d0 = (last - current).normalize_or_zero();
        let d1 = (next - current).normalize_or_zero();

        let right = n1.perp_dot(n0) > 0.0;

        let sum = n0 + n1;
        let miter = if sum.length_squared() < f32::EPSILON {
            // Full reversal: n0 and n1 cancel out.
            Vec2::new(n1.y - n0.y, n0.x - n1.x)
        } else {
            let mut theta = if right {
                d1.y.atan2(d1.x) - d0.y.atan2(d0.x)
            } else {
                d0.y.atan2(d0.x) - d1.y.atan2(d1.x)
            };
            if theta < 0.0 {
                theta += TAU;
            }
            sum.normalize() / (theta * 0.5).sin().max(MITER_EPSILON)
        };

        if i == 1 {
            out.push(last + n0 * extrude);
            out.push(last - n0 * extrude);
        }

        if right {
            out.push(current - miter * extrude);
        } else {
            out.push(current - n0 * extrude);
            out.push(current - n1 * extrude);
        }

        last = current;
    }
}

/// Outline points of a strip `extrude` wide on each side of `line`.
///
/// The result is an open ring: forward pass along one side, backward pass
/// along the other.
pub fn offset_polyline(line: &[Vec3], extrude: f32) -> Vec<Vec3> {
    let mut points: Vec<Vec2> = Vec::with_capacity(line.len());
    for p in line {
        let p = p.truncate();
        if points.last() != Some(&p) {
            points.push(p);
        }
    }

    let mut ring: Vec<Vec2> = Vec::new();

    match points.len() {
        0 | 1 => {}
        2 => {
            let (p0, p1) = (points[0], points[1]);
            let n = perp(p1 - p0) * extrude;
            ring.extend_from_slice(&[p0 - n, p0 + n, p1 + n, p1 - n]);
        }
        _ => {
            offset_pass(&points, extrude, &mut ring);
            points.reverse();
            offset_pass(&points, extrude, &mut ring);
        }
    }

    ring.into_iter().map(|p| p.extend(0.0)).collect()
}

/// Twice the signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[Vec3]) -> f32 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Closed clockwise polygon around `line`, or `None` when too few points
/// survive the offset.
pub fn buffer_polyline(line: &[Vec3], extrude: f32) -> Option<Polygon> {
    let mut ring = offset_polyline(line, extrude);

    if ring.len() < 4 {
        return None;
    }

    // Walls use `up x edge` as their normal, which faces outward on
    // clockwise rings.
    if signed_area(&ring) > 0.0 {
        ring.reverse();
    }

    ring.push(ring[0]);

    Some(vec![ring])
}

/// Insert evenly spaced points so no segment is longer than `1 / subdivision`.
pub fn subdivide_line(line: &[Vec3], subdivision: f32) -> Line {
    let mut out: Line = Vec::with_capacity(line.len());

    let Some(&first) = line.first() else {
        return out;
    };
    out.push(first);

    let max_step = 1.0 / subdivision;

    for seg in line.windows(2) {
        let (p0, p1) = (seg[0], seg[1]);

        if p0 != p1 {
            let distance = p0.distance(p1);

            if distance > max_step {
                let steps = (distance / max_step) as u32;
                let dir = (p1 - p0) / distance;
                let step = distance / steps as f32;

                for s in 1..steps {
                    out.push(p0 + dir * step * s as f32);
                }
            }
        }

        out.push(p1);
    }

    out
}

/// Buffer every line of a road feature into a raised strip draped on terrain.
pub fn build_road_feature(
    feature: &Feature,
    policy: LayerPolicy,
    params: &BuildParams,
    tile: &Tile,
    field: Option<&HeightField>,
    tri: &dyn Triangulator,
) -> Option<MeshFragment> {
    if !params.roads {
        return None;
    }

    let Geometry::Lines(lines) = &feature.geometry else {
        return None;
    };

    if skipped_on_terrain(feature, policy, params, tile, field) {
        return None;
    }

    let inv_scale = tile.inv_scale_f32();
    let extrude = params.roads_extrusion_width * inv_scale;
    let height = params.roads_height * inv_scale;

    let mut mesh = MeshFragment::new();

    for line in lines {
        let polygon = if params.road_subdivision > 0 {
            let dense = subdivide_line(line, params.road_subdivision as f32);
            buffer_polyline(&dense, extrude)
        } else {
            buffer_polyline(line, extrude)
        };

        let Some(polygon) = polygon else {
            continue;
        };

        let start = mesh.vertices.len();

        build_walls(&polygon, 0.0, height, None, inv_scale, &mut mesh);
        build_cap(&polygon, height, 0.0, inv_scale, tri, &mut mesh);

        if let Some(field) = field {
            for v in &mut mesh.vertices[start..] {
                v.position.z += field.sample(v.position.truncate()) * inv_scale;
            }
        }
    }

    if params.normals && field.is_some() {
        mesh.compute_normals();
    }

    (!mesh.is_empty()).then_some(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileId;
    use crate::triangulate::Earcut;

    fn line(points: &[(f32, f32)]) -> Line {
        points.iter().map(|&(x, y)| Vec3::new(x, y, 0.0)).collect()
    }

    fn close(a: Vec3, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-4 && (a.y - y).abs() < 1e-4
    }

    #[test]
    fn test_two_points_make_a_quad() {
        let ring = offset_polyline(&line(&[(0.0, 0.0), (4.0, 0.0)]), 1.0);

        assert_eq!(ring.len(), 4);
        assert!(close(ring[0], 0.0, -1.0));
        assert!(close(ring[1], 0.0, 1.0));
        assert!(close(ring[2], 4.0, 1.0));
        assert!(close(ring[3], 4.0, -1.0));
    }

    #[test]
    fn test_right_turn_single_miter() {
        let ring = offset_polyline(&line(&[(0.0, 0.0), (4.0, 0.0), (4.0, -4.0)]), 1.0);

        assert_eq!(ring.len(), 7);
        assert!(close(ring[0], 0.0, 1.0));
        assert!(close(ring[1], 0.0, -1.0));
        // Inner corner of the turn.
        assert!(close(ring[2], 3.0, -1.0));
        assert!(close(ring[3], 3.0, -4.0));
        assert!(close(ring[4], 5.0, -4.0));
        // Outer corner is bevelled on the way back.
        assert!(close(ring[5], 5.0, 0.0));
        assert!(close(ring[6], 4.0, 1.0));
    }

    #[test]
    fn test_left_turn_two_bevel_points() {
        let ring = offset_polyline(&line(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]), 1.0);

        assert!(close(ring[2], 4.0, -1.0));
        assert!(close(ring[3], 5.0, 0.0));
        // Backward pass turns right at the corner: one miter point.
        assert_eq!(ring.len(), 7);
        assert!(close(ring[6], 3.0, 1.0));
    }

    #[test]
    fn test_reversal_stays_finite() {
        let ring = offset_polyline(&line(&[(0.0, 0.0), (2.0, 0.0), (0.0, 0.0)]), 0.5);
        assert!(!ring.is_empty());
        assert!(ring.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_short_lines_produce_nothing() {
        assert!(offset_polyline(&[], 1.0).is_empty());
        assert!(offset_polyline(&line(&[(1.0, 1.0)]), 1.0).is_empty());
        assert!(offset_polyline(&line(&[(1.0, 1.0), (1.0, 1.0)]), 1.0).is_empty());
        assert!(buffer_polyline(&line(&[(1.0, 1.0)]), 1.0).is_none());
    }

    #[test]
    fn test_buffer_is_closed_and_clockwise() {
        let polygon = buffer_polyline(&line(&[(0.0, 0.0), (4.0, 0.0), (4.0, -4.0)]), 1.0).unwrap();
        let ring = &polygon[0];

        assert_eq!(ring.len(), 8);
        assert_eq!(ring.first(), ring.last());
        assert!(signed_area(&ring[..7]) < 0.0);
    }

    #[test]
    fn test_subdivide_line_counts() {
        let diagonal = subdivide_line(&line(&[(0.0, 0.0), (1.0, 1.0)]), 4.0);
        assert_eq!(diagonal.len(), 6);

        let vertical = subdivide_line(&line(&[(0.0, 0.0), (0.0, 1.0)]), 4.0);
        assert_eq!(vertical.len(), 5);
        assert!(close(vertical[2], 0.0, 0.5));

        let short = subdivide_line(&line(&[(0.0, 0.0), (0.1, 0.0)]), 4.0);
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_road_feature_draped_on_terrain() {
        let tile = Tile::new(TileId::new(19294, 24642, 16));
        let params = BuildParams {
            roads: true,
            normals: true,
            ..BuildParams::default()
        };
        let field = HeightField::new(2, 2, vec![100.0; 4]).unwrap();
        let feature = Feature::new(Geometry::Lines(vec![line(&[(-0.5, 0.0), (0.5, 0.0)])]));
        let policy = params.policy("roads");

        let flat = build_road_feature(&feature, policy, &params, &tile, None, &Earcut).unwrap();
        let draped =
            build_road_feature(&feature, policy, &params, &tile, Some(&field), &Earcut).unwrap();

        assert_eq!(flat.vertices.len(), draped.vertices.len());

        let lift = 100.0 * tile.inv_scale_f32();
        for (a, b) in flat.vertices.iter().zip(&draped.vertices) {
            assert!((b.position.z - a.position.z - lift).abs() < 1e-5);
        }
        assert!(draped.vertices.iter().all(|v| v.normal.is_finite()));
    }

    #[test]
    fn test_roads_disabled_or_wrong_geometry() {
        let tile = Tile::new(TileId::new(0, 0, 1));
        let params = BuildParams::default();
        let feature = Feature::new(Geometry::Lines(vec![line(&[(0.0, 0.0), (0.5, 0.0)])]));
        let policy = params.policy("roads");

        assert!(build_road_feature(&feature, policy, &params, &tile, None, &Earcut).is_none());

        let params = BuildParams {
            roads: true,
            ..params
        };
        let points = Feature::new(Geometry::Points(vec![Vec3::ZERO]));
        assert!(build_road_feature(&points, policy, &params, &tile, None, &Earcut).is_none());
    }
}
