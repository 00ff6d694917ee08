use glam::Vec2;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

use crate::feature::TileData;
use crate::height_field::HeightField;
use crate::mesh::MeshFragment;
use crate::params::{BuildParams, ROADS_LAYER};
use crate::polygon::build_polygon_feature;
use crate::road::build_road_feature;
use crate::terrain::{build_pedestal, build_terrain};
use crate::tile::{Tile, TileId};
use crate::triangulate::Triangulator;
use crate::{Error, Result};

/// Decoded per-tile data, keyed by tile. Missing entries mean "absent".
#[derive(Debug, Default)]
pub struct TileInputs {
    pub heights: HashMap<TileId, HeightField>,
    pub vectors: HashMap<TileId, TileData>,
}

/// Placement of `tile` relative to `origin`; each tile spans 2 units and
/// rows grow southward.
pub fn tile_offset(tile: TileId, origin: TileId) -> Vec2 {
    let dx = tile.x as i64 - origin.x as i64;
    let dy = tile.y as i64 - origin.y as i64;

    Vec2::new((dx * 2) as f32, -(dy * 2) as f32)
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub origin: Option<TileId>,
    pub fragments: Vec<MeshFragment>,
}

impl Scene {
    /// Build every tile in parallel and concatenate the fragments in tile
    /// order (terrain, pedestal, then one fragment per feature).
    pub fn build(
        tiles: &[Tile],
        inputs: &TileInputs,
        params: &BuildParams,
        tri: &dyn Triangulator,
    ) -> Result<Scene> {
        let origin = tiles.first().ok_or(Error::EmptyTileRange)?.id;
        let started = Instant::now();

        let per_tile: Vec<Vec<MeshFragment>> = tiles
            .par_iter()
            .map(|tile| build_tile(tile, origin, inputs, params, tri))
            .collect();

        let fragments: Vec<MeshFragment> = per_tile.into_iter().flatten().collect();

        let scene = Scene {
            origin: Some(origin),
            fragments,
        };

        info!(
            "Built {} fragments ({} vertices, {} triangles) in {:.2?}",
            scene.fragments.len(),
            scene.vertex_count(),
            scene.triangle_count(),
            started.elapsed()
        );

        Ok(scene)
    }

    pub fn vertex_count(&self) -> usize {
        self.fragments.iter().map(|f| f.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.fragments.iter().map(|f| f.triangle_count()).sum()
    }
}

fn build_tile(
    tile: &Tile,
    origin: TileId,
    inputs: &TileInputs,
    params: &BuildParams,
    tri: &dyn Triangulator,
) -> Vec<MeshFragment> {
    let mut out = Vec::new();

    let field = if params.terrain {
        inputs.heights.get(&tile.id)
    } else {
        None
    };

    if let Some(field) = field {
        out.push(build_terrain(tile, field, params));

        if params.pedestal {
            out.push(build_pedestal(tile, field, params));
        }
    }

    if params.wants_vector_data() {
        if let Some(data) = inputs.vectors.get(&tile.id) {
            for layer in &data.layers {
                let policy = params.policy(&layer.name);

                if field.is_some() && !policy.render_on_terrain {
                    continue;
                }

                let is_roads = layer.name == ROADS_LAYER;

                for feature in &layer.features {
                    let mut mesh = MeshFragment::new();

                    if let Some(m) = build_polygon_feature(feature, policy, params, tile, field, tri)
                    {
                        mesh.append(m);
                    }

                    if is_roads {
                        if let Some(m) =
                            build_road_feature(feature, policy, params, tile, field, tri)
                        {
                            mesh.append(m);
                        }
                    }

                    if !mesh.is_empty() {
                        out.push(mesh);
                    }
                }
            }
        }
    }

    place_fragments(&mut out, tile_offset(tile.id, origin));

    debug!("tile {}: {} fragments", tile.id, out.len());

    out
}

/// Move fragments to their tile slot and drop the ones cleanup left empty.
fn place_fragments(fragments: &mut Vec<MeshFragment>, offset: Vec2) {
    for fragment in fragments.iter_mut() {
        fragment.offset = offset;
        fragment.remove_degenerate_triangles();
    }

    fragments.retain(|f| !f.is_empty());
}
