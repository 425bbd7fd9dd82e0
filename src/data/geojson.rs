use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::bounds::Extent;
use crate::core::geo::{transform, Coordinate, Projection};
use crate::engine::feature::{Feature, FeatureRef, Geometry};
use crate::{MapError, Result};

pub type Properties = Map<String, Value>;

/// GeoJSON geometry objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

fn ring(coordinates: &[[f64; 2]], from: Projection, to: Projection) -> Vec<Coordinate> {
    coordinates
        .iter()
        .map(|c| transform(Coordinate::from(*c), from, to))
        .collect()
}

fn rings(polygon: &[Vec<[f64; 2]>], from: Projection, to: Projection) -> Vec<Vec<Coordinate>> {
    polygon.iter().map(|r| ring(r, from, to)).collect()
}

impl GeoJsonGeometry {
    pub fn point(coordinate: Coordinate) -> Self {
        GeoJsonGeometry::Point {
            coordinates: coordinate.to_array(),
        }
    }

    /// Every position of the geometry, exterior and interior rings included.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            GeoJsonGeometry::Point { coordinates } => vec![Coordinate::from(*coordinates)],
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => {
                coordinates.iter().copied().map(Coordinate::from).collect()
            }
            GeoJsonGeometry::Polygon { coordinates }
            | GeoJsonGeometry::MultiLineString { coordinates } => coordinates
                .iter()
                .flatten()
                .copied()
                .map(Coordinate::from)
                .collect(),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .copied()
                .map(Coordinate::from)
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.coordinates()).collect()
            }
        }
    }

    /// Engine geometries reprojected from `from` to `to`. Multi-part
    /// geometries and collections yield one geometry per part.
    pub fn to_geometries(&self, from: Projection, to: Projection) -> Vec<Geometry> {
        match self {
            GeoJsonGeometry::Point { coordinates } => {
                vec![Geometry::Point(transform(Coordinate::from(*coordinates), from, to))]
            }
            GeoJsonGeometry::LineString { coordinates } => {
                vec![Geometry::LineString(ring(coordinates, from, to))]
            }
            GeoJsonGeometry::Polygon { coordinates } => {
                vec![Geometry::Polygon(rings(coordinates, from, to))]
            }
            GeoJsonGeometry::MultiPoint { coordinates } => coordinates
                .iter()
                .map(|c| Geometry::Point(transform(Coordinate::from(*c), from, to)))
                .collect(),
            GeoJsonGeometry::MultiLineString { coordinates } => coordinates
                .iter()
                .map(|line| Geometry::LineString(ring(line, from, to)))
                .collect(),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|polygon| Geometry::Polygon(rings(polygon, from, to)))
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .flat_map(|g| g.to_geometries(from, to))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl GeoJsonFeature {
    pub fn new(id: impl Into<Value>, geometry: GeoJsonGeometry, properties: Properties) -> Self {
        Self {
            id: Some(id.into()),
            geometry: Some(geometry),
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// Engine features for this GeoJSON feature, all sharing its properties.
    /// A feature without geometry yields nothing.
    pub fn to_features(&self, from: Projection, to: Projection) -> Vec<FeatureRef> {
        let Some(geometry) = &self.geometry else {
            log::trace!("skipping GeoJSON feature {:?} without geometry", self.id);
            return Vec::new();
        };
        let properties = self.properties.clone().unwrap_or_default();
        geometry
            .to_geometries(from, to)
            .into_iter()
            .map(|g| Feature::new(g).with_properties(properties.clone()).into_ref())
            .collect()
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
    Geometry(GeoJsonGeometry),
}

impl GeoJson {
    pub fn feature_collection(features: Vec<GeoJsonFeature>) -> Self {
        GeoJson::FeatureCollection { features }
    }

    pub fn empty() -> Self {
        Self::feature_collection(Vec::new())
    }

    pub fn features(&self) -> &[GeoJsonFeature] {
        match self {
            GeoJson::Feature(feature) => std::slice::from_ref(feature),
            GeoJson::FeatureCollection { features } => features,
            GeoJson::Geometry(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.features().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    /// Bounding box of every position in the document, in its own units.
    pub fn extent(&self) -> Option<Extent> {
        let coordinates: Vec<Coordinate> = match self {
            GeoJson::Geometry(geometry) => geometry.coordinates(),
            _ => self
                .features()
                .iter()
                .filter_map(|f| f.geometry.as_ref())
                .flat_map(GeoJsonGeometry::coordinates)
                .collect(),
        };
        Extent::from_coordinates(&coordinates)
    }

    /// Reads the document into engine features, reprojecting positions from
    /// `data_projection` into `feature_projection`.
    pub fn read_features(
        &self,
        data_projection: Projection,
        feature_projection: Projection,
    ) -> Vec<FeatureRef> {
        match self {
            GeoJson::Geometry(geometry) => geometry
                .to_geometries(data_projection, feature_projection)
                .into_iter()
                .map(|g| Feature::new(g).into_ref())
                .collect(),
            _ => self
                .features()
                .iter()
                .flat_map(|f| f.to_features(data_projection, feature_projection))
                .collect(),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromStr for GeoJson {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| MapError::ParseError(format!("invalid GeoJSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::from_lon_lat;
    use approx::assert_relative_eq;

    const COLLECTION: &str = r#"
    {
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "a",
                "properties": {"name": "Test Point", "layer": "primary"},
                "geometry": {"type": "Point", "coordinates": [-74.0060, 40.7128]}
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "MultiPoint", "coordinates": [[1.0, 2.0], [3.0, 4.0]]}
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": null
            }
        ]
    }
    "#;

    #[test]
    fn test_parse_collection() {
        let geojson: GeoJson = COLLECTION.parse().unwrap();
        assert_eq!(geojson.len(), 3);
        let first = &geojson.features()[0];
        assert_eq!(first.id, Some(Value::from("a")));
        assert_eq!(first.property("layer"), Some(&Value::from("primary")));
    }

    #[test]
    fn test_invalid_document_is_a_parse_error() {
        let result = "{\"type\": \"Nope\"}".parse::<GeoJson>();
        assert!(matches!(result, Err(MapError::ParseError(_))));
    }

    #[test]
    fn test_read_features_splits_parts_and_skips_empty_geometry() {
        let geojson: GeoJson = COLLECTION.parse().unwrap();
        let features = geojson.read_features(Projection::Epsg4326, Projection::Epsg3857);
        assert_eq!(features.len(), 3);

        let expected = from_lon_lat(Coordinate::new(-74.0060, 40.7128));
        let Some(Geometry::Point(at)) = features[0].geometry() else {
            panic!("expected a point");
        };
        assert_relative_eq!(at.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(at.y, expected.y, epsilon = 1e-6);
        assert_eq!(features[0].get("name"), Some(&Value::from("Test Point")));
        assert!(features[1].properties().is_empty());
    }

    #[test]
    fn test_extent_covers_all_positions() {
        let geojson: GeoJson = COLLECTION.parse().unwrap();
        let extent = geojson.extent().unwrap();
        assert_eq!(extent.min, Coordinate::new(-74.0060, 2.0));
        assert_eq!(extent.max, Coordinate::new(3.0, 40.7128));
        assert!(GeoJson::empty().extent().is_none());
    }

    #[test]
    fn test_polygon_keeps_rings() {
        let geometry = GeoJsonGeometry::Polygon {
            coordinates: vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
            ],
        };
        let parts = geometry.to_geometries(Projection::Epsg3857, Projection::Epsg3857);
        assert!(matches!(&parts[..], [Geometry::Polygon(rings)] if rings.len() == 2));
        assert_eq!(geometry.coordinates().len(), 8);
    }
}
