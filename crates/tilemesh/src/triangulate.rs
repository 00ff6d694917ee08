use glam::Vec2;
use log::debug;

use crate::feature::Polygon;

/// Output of a triangulator: 2D points and a triangle list over them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Triangulation {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Polygon (with holes) -> triangles. An empty result means "nothing to cap".
pub trait Triangulator: Sync {
    fn triangulate(&self, polygon: &Polygon) -> Triangulation;
}

/// Ear-clipping via `earcutr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Earcut;

impl Triangulator for Earcut {
    fn triangulate(&self, polygon: &Polygon) -> Triangulation {
        let mut vertices: Vec<Vec2> = Vec::new();
        let mut holes: Vec<usize> = Vec::new();

        for (ring_index, ring) in polygon.iter().enumerate() {
            let mut points: Vec<Vec2> = ring.iter().map(|p| p.truncate()).collect();

            // Rings usually repeat their first point at the end.
            while points.len() > 1 && points.first() == points.last() {
                points.pop();
            }

            if points.len() < 3 {
                if ring_index == 0 {
                    return Triangulation::default();
                }
                continue;
            }

            if ring_index > 0 {
                holes.push(vertices.len());
            }

            vertices.extend(points);
        }

        let flat: Vec<f64> = vertices
            .iter()
            .flat_map(|v| [v.x as f64, v.y as f64])
            .collect();

        match earcutr::earcut(&flat, &holes, 2) {
            Ok(indices) => Triangulation {
                vertices,
                indices: indices.into_iter().map(|i| i as u32).collect(),
            },
            Err(err) => {
                debug!("triangulation failed: {err:?}");
                Triangulation::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ring(points: &[(f32, f32)]) -> Vec<Vec3> {
        points.iter().map(|&(x, y)| Vec3::new(x, y, 0.0)).collect()
    }

    #[test]
    fn test_closed_square() {
        let square = vec![ring(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ])];

        let t = Earcut.triangulate(&square);

        assert_eq!(t.vertices.len(), 4);
        assert_eq!(t.indices.len(), 6);
    }

    #[test]
    fn test_square_with_hole() {
        let polygon = vec![
            ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
            ring(&[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)]),
        ];

        let t = Earcut.triangulate(&polygon);

        assert_eq!(t.vertices.len(), 8);
        assert_eq!(t.indices.len(), 8 * 3);
    }

    #[test]
    fn test_degenerate_outer_ring_is_empty() {
        let polygon = vec![ring(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)])];
        assert!(Earcut.triangulate(&polygon).is_empty());
        assert!(Earcut.triangulate(&Vec::new()).is_empty());
    }
}
