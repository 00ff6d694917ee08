use anyhow::{Context, Result};
use log::debug;
use std::io::Cursor;

use tilemesh::HeightField;

/// Decode a terrarium elevation tile.
///
/// `Ok(None)` when the image is not 4-channel: the tile then has no terrain.
pub fn decode_terrain(bytes: &[u8], extrusion_scale: f32) -> Result<Option<HeightField>> {
    let img = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to read image format")?
        .decode()
        .context("Failed to decode terrain image")?;

    let channels = img.color().channel_count() as usize;
    if channels != 4 {
        debug!("terrain image has {channels} channels, ignoring");
        return Ok(None);
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(HeightField::from_rgba(
        width as usize,
        height as usize,
        4,
        rgba.as_raw(),
        extrusion_scale,
    ))
}
