use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use tilemesh::TileId;

/// Local tile store addressed by a path template with `{x}`, `{y}`, `{z}`.
#[derive(Debug, Clone)]
pub struct TileSource {
    template: String,
}

impl TileSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn path_for(&self, tile: TileId) -> PathBuf {
        PathBuf::from(
            self.template
                .replace("{x}", &tile.x.to_string())
                .replace("{y}", &tile.y.to_string())
                .replace("{z}", &tile.z.to_string()),
        )
    }

    /// Raw bytes of one tile. A single attempt, no retries.
    pub fn fetch_bytes(&self, tile: TileId) -> Result<Vec<u8>> {
        let path = self.path_for(tile);
        fs::read(&path).with_context(|| format!("Failed to read tile {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_template() {
        let src = TileSource::new("data/{z}/{x}/{y}.json");
        let path = src.path_for(TileId::new(19294, 24642, 16));
        assert_eq!(path, PathBuf::from("data/16/19294/24642.json"));
    }

    #[test]
    fn test_missing_tile_is_an_error() {
        let src = TileSource::new("/nonexistent-tiles2obj/{z}/{x}/{y}.png");
        let err = src.fetch_bytes(TileId::new(1, 2, 3)).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent-tiles2obj/3/1/2.png"));
    }
}
