use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use std::time::Instant;

use tilemesh::{
    export_obj, stitch_edges, Earcut, HeightField, Scene, Tile, TileData, TileId, TileInputs,
};

mod config;
mod geojson;
mod raster;
mod source;

use config::Config;
use source::TileSource;

/// Everything decoded for one tile; `None` means absent or failed.
struct Decoded {
    id: TileId,
    height: Option<HeightField>,
    vector: Option<TileData>,
}

fn load_terrain(src: &TileSource, tile: &Tile, extrusion_scale: f32) -> Result<Option<HeightField>> {
    let bytes = src.fetch_bytes(tile.id)?;
    raster::decode_terrain(&bytes, extrusion_scale)
}

fn load_vector(src: &TileSource, tile: &Tile) -> Result<TileData> {
    let bytes = src.fetch_bytes(tile.id)?;
    geojson::decode_vector_tile(&bytes, tile)
}

fn decode_tile(
    tile: &Tile,
    terrain: Option<&TileSource>,
    vector: Option<&TileSource>,
    extrusion_scale: f32,
) -> Decoded {
    let height = terrain.and_then(|src| match load_terrain(src, tile, extrusion_scale) {
        Ok(Some(field)) => Some(field),
        Ok(None) => {
            warn!("Tile {}: terrain image is not RGBA, no terrain", tile.id);
            None
        }
        Err(err) => {
            warn!("Tile {}: failed to load terrain: {:#}", tile.id, err);
            None
        }
    });

    let vector = vector.and_then(|src| match load_vector(src, tile) {
        Ok(data) => Some(data),
        Err(err) => {
            warn!("Tile {}: failed to load vector data: {:#}", tile.id, err);
            None
        }
    });

    Decoded {
        id: tile.id,
        height,
        vector,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Config::parse();
    let started = Instant::now();

    // Resolve the tile rectangle and build settings.
    let range = cfg.tile_range().context("Invalid tile range")?;
    let tiles = range.tiles()?;
    let origin = tiles[0].id;
    let params = cfg.build_params();

    let terrain_src = match (&cfg.terrain_source, params.terrain) {
        (Some(t), true) => Some(TileSource::new(t.as_str())),
        (None, true) => bail!("--terrain requires --terrain-source"),
        (_, false) => None,
    };

    let vector_src = if params.wants_vector_data() {
        cfg.vector_source.as_deref().map(TileSource::new)
    } else {
        None
    };

    if params.wants_vector_data() && vector_src.is_none() {
        warn!("No --vector-source given; buildings and roads are skipped");
    }

    info!("Loading {} tiles...", tiles.len());

    // Fetch and decode in parallel; a failing tile only loses its own data.
    let decoded: Vec<Decoded> = tiles
        .par_iter()
        .map(|tile| {
            decode_tile(
                tile,
                terrain_src.as_ref(),
                vector_src.as_ref(),
                params.terrain_extrusion_scale,
            )
        })
        .collect();

    let mut inputs = TileInputs::default();
    for d in decoded {
        if let Some(h) = d.height {
            inputs.heights.insert(d.id, h);
        }
        if let Some(v) = d.vector {
            inputs.vectors.insert(d.id, v);
        }
    }

    info!(
        "Decoded {} terrain and {} vector tiles ({} features)",
        inputs.heights.len(),
        inputs.vectors.len(),
        inputs.vectors.values().map(TileData::feature_count).sum::<usize>()
    );

    // Every tile is decoded at this point, so shared borders can be fixed up.
    if params.terrain {
        stitch_edges(&mut inputs.heights);
    }

    let scene = Scene::build(&tiles, &inputs, &params, &Earcut)?;

    let options = cfg.export_options(origin);
    let out_path = format!("{}.obj", options.name);

    let stats = export_obj(&out_path, &scene.fragments, &options)
        .with_context(|| format!("Failed to write {out_path}"))?;

    info!(
        "Done: {} groups, {} vertices, {} triangles in {:.2?}",
        stats.groups,
        stats.vertices,
        stats.triangles,
        started.elapsed()
    );

    Ok(())
}
