use clap::{ArgAction, Parser};
use glam::Vec2;
use std::collections::HashMap;

use tilemesh::{BuildParams, ExportOptions, LayerPolicy, TileId, TileRange};

/// `tiles2obj` - converts a rectangle of map tiles into a Wavefront OBJ mesh.
///
/// Vector tiles (GeoJSON layers) become extruded buildings and road strips,
/// terrarium-encoded PNG tiles become a terrain surface. Tiles are read from
/// local path templates containing `{x}`, `{y}` and `{z}`.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiles2obj", version, about, long_about = None)]
pub struct Config {
    /// Output file name without extension; defaults to `x.y.z` of the first tile.
    #[arg(long, env = "TILES2OBJ_NAME")]
    pub name: Option<String>,

    /// Tile column, `N` or an inclusive range `A/B`.
    #[arg(long, env = "TILES2OBJ_TILEX")]
    pub tilex: String,

    /// Tile row, `N` or an inclusive range `A/B`.
    #[arg(long, env = "TILES2OBJ_TILEY")]
    pub tiley: String,

    #[arg(long, env = "TILES2OBJ_TILEZ")]
    pub tilez: u32,

    /// Path template of the GeoJSON vector tiles, e.g. `tiles/{z}/{x}/{y}.json`.
    #[arg(long, env = "TILES2OBJ_VECTOR_SOURCE")]
    pub vector_source: Option<String>,

    /// Path template of the terrarium PNG tiles.
    #[arg(long, env = "TILES2OBJ_TERRAIN_SOURCE")]
    pub terrain_source: Option<String>,

    /// Write one OBJ group per mesh fragment.
    #[arg(long, env = "TILES2OBJ_SPLIT_MESHES")]
    pub split_meshes: bool,

    /// Append to an existing output file, continuing its indices.
    #[arg(long, env = "TILES2OBJ_APPEND")]
    pub append: bool,

    #[arg(long, env = "TILES2OBJ_TERRAIN")]
    pub terrain: bool,

    /// Quads per tile side of the terrain grid.
    #[arg(long, default_value_t = 64, env = "TILES2OBJ_TERRAIN_SUBDIVISION")]
    pub terrain_subdivision: u32,

    #[arg(long, default_value_t = 1.0, env = "TILES2OBJ_TERRAIN_EXTRUSION_SCALE")]
    pub terrain_extrusion_scale: f32,

    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "TILES2OBJ_BUILDINGS")]
    pub buildings: bool,

    #[arg(long, default_value_t = 1.0, env = "TILES2OBJ_BUILDINGS_EXTRUSION_SCALE")]
    pub buildings_extrusion_scale: f32,

    #[arg(long, env = "TILES2OBJ_ROADS")]
    pub roads: bool,

    /// Road strip height in meters.
    #[arg(long, default_value_t = 1.0, env = "TILES2OBJ_ROADS_HEIGHT")]
    pub roads_height: f32,

    /// Road half width in meters.
    #[arg(long, default_value_t = 5.0, env = "TILES2OBJ_ROADS_EXTRUSION_WIDTH")]
    pub roads_extrusion_width: f32,

    /// Densify road lines before buffering (segments per tile unit, 0 = off).
    #[arg(long, default_value_t = 0, env = "TILES2OBJ_ROAD_SUBDIVISION")]
    pub road_subdivision: u32,

    /// Export vertex normals.
    #[arg(long, env = "TILES2OBJ_NORMALS")]
    pub normals: bool,

    /// Add a skirt and floor under the terrain.
    #[arg(long, env = "TILES2OBJ_PEDESTAL")]
    pub pedestal: bool,

    /// Pedestal floor height in meters.
    #[arg(long, default_value_t = -20.0, allow_negative_numbers = true, env = "TILES2OBJ_PEDESTAL_HEIGHT")]
    pub pedestal_height: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, env = "TILES2OBJ_OFFSET_X")]
    pub offset_x: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, env = "TILES2OBJ_OFFSET_Y")]
    pub offset_y: f32,

    /// Layers still built on tiles that have terrain.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "buildings,roads",
        env = "TILES2OBJ_TERRAIN_LAYERS"
    )]
    pub terrain_layers: Vec<String>,

    /// Layers whose zero-height features are kept on terrain.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "roads",
        env = "TILES2OBJ_KEEP_FLAT_LAYERS"
    )]
    pub keep_flat_layers: Vec<String>,
}

impl Config {
    pub fn tile_range(&self) -> tilemesh::Result<TileRange> {
        TileRange::parse(&self.tilex, &self.tiley, self.tilez)
    }

    pub fn build_params(&self) -> BuildParams {
        let layers: HashMap<String, LayerPolicy> = self
            .terrain_layers
            .iter()
            .map(|name| {
                let policy = LayerPolicy {
                    render_on_terrain: true,
                    skip_flat_on_terrain: !self.keep_flat_layers.contains(name),
                };
                (name.clone(), policy)
            })
            .collect();

        BuildParams {
            terrain: self.terrain,
            terrain_subdivision: self.terrain_subdivision,
            terrain_extrusion_scale: self.terrain_extrusion_scale,
            buildings: self.buildings,
            buildings_extrusion_scale: self.buildings_extrusion_scale,
            roads: self.roads,
            roads_height: self.roads_height,
            roads_extrusion_width: self.roads_extrusion_width,
            road_subdivision: self.road_subdivision,
            normals: self.normals,
            pedestal: self.pedestal,
            pedestal_height: self.pedestal_height,
            layers,
        }
    }

    pub fn output_name(&self, origin: TileId) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}.{}.{}", origin.x, origin.y, origin.z))
    }

    pub fn export_options(&self, origin: TileId) -> ExportOptions {
        ExportOptions {
            name: self.output_name(origin),
            split: self.split_meshes,
            normals: self.normals,
            append: self.append,
            offset: Vec2::new(self.offset_x, self.offset_y),
        }
    }
}
