//! Mapzen-style GeoJSON vector tiles: one FeatureCollection per layer name.

use anyhow::{Context, Result};
use glam::Vec3;
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use tilemesh::projection::lon_lat_to_meters;
use tilemesh::{Feature, Geometry, Layer, Line, Polygon, PropertyValue, Tile, TileData};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    geometry: Option<GeoGeometry>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

struct Projector<'a> {
    tile: &'a Tile,
}

impl Projector<'_> {
    fn point(&self, pos: &[f64]) -> Option<Vec3> {
        let [lon, lat, ..] = pos else {
            return None;
        };

        let local = self.tile.to_local(lon_lat_to_meters(*lon, *lat));
        Some(local.extend(0.0))
    }

    fn line(&self, coords: &[Position]) -> Line {
        coords.iter().filter_map(|p| self.point(p)).collect()
    }

    fn polygon(&self, rings: &[Vec<Position>]) -> Polygon {
        rings.iter().map(|r| self.line(r)).collect()
    }

    fn geometry(&self, geometry: &GeoGeometry) -> Option<Geometry> {
        let g = match geometry {
            GeoGeometry::Point { coordinates } => {
                Geometry::Points(self.point(coordinates).into_iter().collect())
            }
            GeoGeometry::MultiPoint { coordinates } => Geometry::Points(self.line(coordinates)),
            GeoGeometry::LineString { coordinates } => {
                Geometry::Lines(vec![self.line(coordinates)])
            }
            GeoGeometry::MultiLineString { coordinates } => {
                Geometry::Lines(coordinates.iter().map(|l| self.line(l)).collect())
            }
            GeoGeometry::Polygon { coordinates } => {
                Geometry::Polygons(vec![self.polygon(coordinates)])
            }
            GeoGeometry::MultiPolygon { coordinates } => {
                Geometry::Polygons(coordinates.iter().map(|p| self.polygon(p)).collect())
            }
            GeoGeometry::Unsupported => return None,
        };

        Some(g)
    }
}

fn properties(raw: &serde_json::Map<String, serde_json::Value>) -> HashMap<String, PropertyValue> {
    raw.iter()
        .filter_map(|(key, value)| {
            let v = match value {
                serde_json::Value::Number(n) => PropertyValue::Number(n.as_f64()?),
                serde_json::Value::String(s) => PropertyValue::String(s.clone()),
                _ => return None,
            };
            Some((key.clone(), v))
        })
        .collect()
}

/// Decode a vector tile into tile-local features.
///
/// Layer values that are not feature collections and geometries of
/// unsupported types are skipped.
pub fn decode_vector_tile(bytes: &[u8], tile: &Tile) -> Result<TileData> {
    let root: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(bytes).context("Failed to parse vector tile JSON")?;

    let projector = Projector { tile };
    let mut data = TileData::default();

    for (name, value) in root {
        let collection: FeatureCollection = match serde_json::from_value(value) {
            Ok(c) => c,
            Err(e) => {
                debug!("tile {}: skipping layer {name}: {e}", tile.id);
                continue;
            }
        };

        let mut layer = Layer::new(name);

        for feature in &collection.features {
            let Some(geometry) = feature.geometry.as_ref().and_then(|g| projector.geometry(g))
            else {
                continue;
            };

            layer.features.push(Feature {
                geometry,
                props: properties(&feature.properties),
            });
        }

        data.layers.push(layer);
    }

    Ok(data)
}
