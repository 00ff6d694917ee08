use std::collections::HashMap;

/// Layer whose line features are buffered into road strips.
pub const ROADS_LAYER: &str = "roads";

pub const BUILDINGS_LAYER: &str = "buildings";

/// How features of one layer are treated when the tile has terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerPolicy {
    /// Build the layer at all on a tile with a height field.
    pub render_on_terrain: bool,
    /// Drop features with zero height when a height field is present.
    pub skip_flat_on_terrain: bool,
}

impl LayerPolicy {
    pub const HIDDEN: LayerPolicy = LayerPolicy {
        render_on_terrain: false,
        skip_flat_on_terrain: true,
    };
}

impl Default for LayerPolicy {
    fn default() -> Self {
        Self::HIDDEN
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildParams {
    pub terrain: bool,
    /// Quads per tile side for the terrain plane and pedestal walls.
    pub terrain_subdivision: u32,
    pub terrain_extrusion_scale: f32,

    pub buildings: bool,
    pub buildings_extrusion_scale: f32,

    pub roads: bool,
    /// Meters.
    pub roads_height: f32,
    /// Half width of a road strip in meters.
    pub roads_extrusion_width: f32,
    /// Densify road center lines before buffering; 0 disables.
    pub road_subdivision: u32,

    pub normals: bool,

    pub pedestal: bool,
    /// Meters, usually negative.
    pub pedestal_height: f32,

    /// Per-layer behaviour on terrain tiles. Unlisted layers get
    /// `LayerPolicy::HIDDEN`.
    pub layers: HashMap<String, LayerPolicy>,
}

impl BuildParams {
    pub fn policy(&self, layer: &str) -> LayerPolicy {
        self.layers.get(layer).copied().unwrap_or_default()
    }

    pub fn wants_vector_data(&self) -> bool {
        self.buildings || self.roads
    }
}

impl Default for BuildParams {
    fn default() -> Self {
        let mut layers = HashMap::new();
        layers.insert(
            BUILDINGS_LAYER.to_string(),
            LayerPolicy {
                render_on_terrain: true,
                skip_flat_on_terrain: true,
            },
        );
        layers.insert(
            ROADS_LAYER.to_string(),
            LayerPolicy {
                render_on_terrain: true,
                skip_flat_on_terrain: false,
            },
        );

        Self {
            terrain: false,
            terrain_subdivision: 64,
            terrain_extrusion_scale: 1.0,
            buildings: true,
            buildings_extrusion_scale: 1.0,
            roads: false,
            roads_height: 1.0,
            roads_extrusion_width: 5.0,
            road_subdivision: 0,
            normals: false,
            pedestal: false,
            pedestal_height: -20.0,
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies() {
        let p = BuildParams::default();

        let roads = p.policy(ROADS_LAYER);
        assert!(roads.render_on_terrain && !roads.skip_flat_on_terrain);

        let buildings = p.policy(BUILDINGS_LAYER);
        assert!(buildings.render_on_terrain && buildings.skip_flat_on_terrain);

        assert_eq!(p.policy("water"), LayerPolicy::HIDDEN);
    }
}
