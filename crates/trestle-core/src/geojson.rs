//! GeoJSON output for map layers.
//!
//! Each individual becomes one `Feature` whose numeric `id` is
//! [`hash_id`](crate::id::hash_id) of the individual's identifier, so the map
//! can address features without carrying full URIs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
  Individual, Result,
  id::{filter_id, hash_id},
  wkt::{Coord, Geometry, Line},
};

// ─── Geometry ────────────────────────────────────────────────────────────────

type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
  /// Empty `coordinates` for `POINT EMPTY`.
  Point { coordinates: Vec<f64> },
  LineString { coordinates: Vec<Position> },
  Polygon { coordinates: Vec<Vec<Position>> },
  MultiPoint { coordinates: Vec<Position> },
  MultiLineString { coordinates: Vec<Vec<Position>> },
  MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
  GeometryCollection { geometries: Vec<GeoJsonGeometry> },
}

fn position(c: &Coord) -> Position { [c.x, c.y] }

fn positions(line: &Line) -> Vec<Position> { line.iter().map(position).collect() }

impl From<&Geometry> for GeoJsonGeometry {
  fn from(geometry: &Geometry) -> Self {
    match geometry {
      Geometry::Point(c) => Self::Point {
        coordinates: c.map(|c| vec![c.x, c.y]).unwrap_or_default(),
      },
      Geometry::LineString(line) => Self::LineString {
        coordinates: positions(line),
      },
      Geometry::Polygon(rings) => Self::Polygon {
        coordinates: rings.iter().map(positions).collect(),
      },
      Geometry::MultiPoint(points) => Self::MultiPoint {
        coordinates: points.iter().map(position).collect(),
      },
      Geometry::MultiLineString(lines) => Self::MultiLineString {
        coordinates: lines.iter().map(positions).collect(),
      },
      Geometry::MultiPolygon(polygons) => Self::MultiPolygon {
        coordinates: polygons
          .iter()
          .map(|rings| rings.iter().map(positions).collect())
          .collect(),
      },
      Geometry::GeometryCollection(members) => Self::GeometryCollection {
        geometries: members.iter().map(Self::from).collect(),
      },
    }
  }
}

// ─── Features ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
  #[default]
  Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionTag {
  #[default]
  FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  #[serde(rename = "type")]
  pub tag:        FeatureTag,
  pub id:         i32,
  pub geometry:   GeoJsonGeometry,
  pub properties: Map<String, Value>,
}

impl Feature {
  /// Build the map feature for an individual from its `asWKT` fact.
  pub fn from_individual(individual: &Individual) -> Result<Self> {
    let geometry = individual.spatial_value()?;
    let mut properties = Map::new();
    properties.insert("id".into(), json!(individual.id()));
    properties.insert("filteredId".into(), json!(filter_id(individual.id())));
    Ok(Self {
      tag: FeatureTag::Feature,
      id: hash_id(individual.id()),
      geometry: GeoJsonGeometry::from(&geometry),
      properties,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
  #[serde(rename = "type")]
  pub tag:      FeatureCollectionTag,
  pub features: Vec<Feature>,
}

impl FeatureCollection {
  pub fn new(features: Vec<Feature>) -> Self {
    Self {
      tag: FeatureCollectionTag::FeatureCollection,
      features,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::wkt;

  #[test]
  fn polygon_serialises_as_nested_positions() {
    let g = wkt::parse("POLYGON ((0 0, 1 0, 1 1, 0 0))").unwrap();
    let value = serde_json::to_value(GeoJsonGeometry::from(&g)).unwrap();
    assert_eq!(
      value,
      json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
      })
    );
  }

  #[test]
  fn collection_nests_geometries() {
    let g = wkt::parse("GEOMETRYCOLLECTION (POINT (1 2), POINT EMPTY)").unwrap();
    let value = serde_json::to_value(GeoJsonGeometry::from(&g)).unwrap();
    assert_eq!(value["type"], "GeometryCollection");
    assert_eq!(value["geometries"][0]["coordinates"], json!([1.0, 2.0]));
    assert_eq!(value["geometries"][1]["coordinates"], json!([]));
  }

  #[test]
  fn empty_collection_has_type_tag() {
    let value = serde_json::to_value(FeatureCollection::new(vec![])).unwrap();
    assert_eq!(value, json!({ "type": "FeatureCollection", "features": [] }));
  }
}
