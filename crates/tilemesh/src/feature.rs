//! Decoded vector tile content. Coordinates are tile-local, `z` is unused.

use glam::Vec3;
use std::collections::HashMap;

pub type Line = Vec<Vec3>;

/// First ring is the outer boundary, the rest are holes.
pub type Polygon = Vec<Line>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Points(Vec<Vec3>),
    Lines(Vec<Line>),
    Polygons(Vec<Polygon>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub props: HashMap<String, PropertyValue>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            props: HashMap::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: PropertyValue) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    /// Numeric property, `None` when missing or not a number.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.props.get(key) {
            Some(PropertyValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub name: String,
    pub features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileData {
    pub layers: Vec<Layer>,
}

impl TileData {
    /// Features across all layers.
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features.len()).sum()
    }
}
