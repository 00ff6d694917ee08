//! tilemesh: turns map tiles into one indexed triangle mesh.
//!
//! - Vector features (already in tile-local [-1, 1] coordinates) become
//!   extruded building blocks and buffered road strips.
//! - Optional elevation tiles become a subdivided terrain surface, with
//!   seams between neighbouring tiles stitched before anything is built.
//! - Every tile spans 2 units; tiles are laid side by side around the first
//!   tile of the requested range.
//! - The result is written as Wavefront OBJ, optionally appended to an
//!   existing file without index collisions.
//!
//! Pipeline:
//!   decode (per tile, external) -> `stitch_edges` -> `Scene::build` -> `export_obj`
//!
//! OBJ layout written per group:
//!   o <name>
//!   v  x y z            (positions, placement offsets applied)
//!   vn x y z            (normals, optional)
//!   f  a b c | a//a ... (1-based, global indices)

pub mod feature;
pub mod height_field;
pub mod mesh;
pub mod obj;
pub mod params;
pub mod polygon;
pub mod projection;
pub mod road;
pub mod scene;
pub mod terrain;
pub mod tile;
pub mod triangulate;

pub use feature::{Feature, Geometry, Layer, Line, Polygon, PropertyValue, TileData};
pub use height_field::{sample_elevation, stitch_edges, HeightField};
pub use mesh::{MeshFragment, Vertex};
pub use obj::{export_obj, scan_max_face_index, write_obj, ExportOptions, ExportStats};
pub use params::{BuildParams, LayerPolicy};
pub use scene::{tile_offset, Scene, TileInputs};
pub use tile::{Borders, Tile, TileId, TileRange};
pub use triangulate::{Earcut, Triangulation, Triangulator};

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested rectangle contains no tile.
    #[error("no tiles to build")]
    EmptyTileRange,

    #[error("bad tile range {0:?}: expected `N` or `A/B` with A <= B inside the zoom grid")]
    InvalidTileRange(String),

    #[error("zoom {0} out of range, expected 0..={max}", max = tile::MAX_ZOOM)]
    InvalidZoom(u32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
