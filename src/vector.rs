//! Polygon layers, stored as GeoJSON feature collections

use std::fs;
use std::path::Path;

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

use crate::{Result, SegtileError};

/// Attribute holding the object id of each feature
pub const VALUE_FIELD: &str = "PXLVAL";

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub pxlval: i64,
    /// Exterior rings counter-clockwise, interior rings clockwise
    pub geometry: MultiPolygon<f64>,
}

/// One layer of polygon features in a single container file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorLayer {
    pub name: String,
    pub projection: String,
    pub features: Vec<Feature>,
}

impl Feature {
    pub fn new(pxlval: i64, polygons: Vec<Polygon<f64>>) -> Self {
        Self {
            pxlval,
            geometry: MultiPolygon::new(polygons).orient(Direction::Default),
        }
    }

    fn to_geojson(&self) -> Value {
        let geometry = match self.geometry.0.as_slice() {
            [polygon] => json!({ "type": "Polygon", "coordinates": polygon_coordinates(polygon) }),
            polygons => json!({
                "type": "MultiPolygon",
                "coordinates": polygons.iter().map(polygon_coordinates).collect::<Vec<_>>(),
            }),
        };
        let mut properties = Map::new();
        properties.insert(VALUE_FIELD.to_owned(), json!(self.pxlval));
        json!({ "type": "Feature", "properties": properties, "geometry": geometry })
    }

    fn from_geojson(value: &Value) -> Option<Self> {
        let pxlval = value["properties"][VALUE_FIELD].as_i64()?;
        let geometry = &value["geometry"];
        let coordinates = geometry["coordinates"].as_array()?;
        let polygons = match geometry["type"].as_str()? {
            "Polygon" => vec![parse_polygon(coordinates)?],
            "MultiPolygon" => coordinates
                .iter()
                .map(|p| parse_polygon(p.as_array()?))
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        Some(Self { pxlval, geometry: MultiPolygon::new(polygons) })
    }
}

impl VectorLayer {
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "name": self.name,
            "crs_wkt": self.projection,
            "features": self.features.iter().map(Feature::to_geojson).collect::<Vec<_>>(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(&self.to_geojson()).map_err(|e| SegtileError::json(path, e))?;
        fs::write(path, bytes).map_err(|e| SegtileError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SegtileError::io(path, e))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| SegtileError::json(path, e))?;
        let malformed = |what: &str| SegtileError::Vector(format!("{}: {}", path.display(), what));
        let features = value["features"]
            .as_array()
            .ok_or_else(|| malformed("no feature array"))?
            .iter()
            .map(|f| Feature::from_geojson(f).ok_or_else(|| malformed("malformed feature")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: value["name"].as_str().unwrap_or_default().to_owned(),
            projection: value["crs_wkt"].as_str().unwrap_or_default().to_owned(),
            features,
        })
    }
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Value {
    Value::Array(
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors().iter())
            .map(ring_coordinates)
            .collect(),
    )
}

fn parse_ring(value: &Value) -> Option<LineString<f64>> {
    value
        .as_array()?
        .iter()
        .map(|c| Some(Coord { x: c.get(0)?.as_f64()?, y: c.get(1)?.as_f64()? }))
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn parse_polygon(rings: &[Value]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        parse_ring(exterior)?,
        interiors.iter().map(parse_ring).collect::<Option<Vec<_>>>()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        // clockwise on purpose
        polygon![
            (x: x, y: y),
            (x: x, y: y + size),
            (x: x + size, y: y + size),
            (x: x + size, y: y),
        ]
    }

    #[test]
    fn exterior_is_counter_clockwise() {
        use geo::Winding;
        let feature = Feature::new(0, vec![square(0.0, 0.0, 1.0)]);
        assert!(feature.geometry.0[0].exterior().is_ccw());
    }

    #[test]
    fn single_polygon_geometry() {
        let layer = VectorLayer {
            name: "tile_segs_mskd_lbl_vec1".into(),
            projection: String::new(),
            features: vec![Feature::new(0, vec![square(0.0, 0.0, 1.0)])],
        };
        let json = layer.to_geojson();
        assert_eq!(json["name"], "tile_segs_mskd_lbl_vec1");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(json["features"][0]["properties"]["PXLVAL"], 0);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.geojson");
        let layer = VectorLayer {
            name: "layer".into(),
            projection: "LOCAL_CS[\"t\"]".into(),
            features: vec![
                Feature::new(0, vec![square(0.0, 0.0, 1.0)]),
                Feature::new(1, vec![square(5.0, 5.0, 1.0), square(8.0, 8.0, 2.0)]),
            ],
        };
        layer.write(&path).unwrap();
        let read = VectorLayer::read(&path).unwrap();
        assert_eq!(read, layer);
        assert_eq!(layer.to_geojson()["features"][1]["geometry"]["type"], "MultiPolygon");
    }
}
