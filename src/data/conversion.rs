//! Conversions from search results and component props into GeoJSON.
//!
//! Points are always written in the projection the map displays; the
//! single-facet and props helpers assume lon/lat input and Web Mercator
//! output.

use serde_json::{json, Value};

use crate::core::geo::{from_lon_lat, transform, Coordinate, Projection};
use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Properties};
use crate::search::facets::{palette_color, Facet, Facets, GeoFacet};
use crate::{MapError, Result};

fn properties(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn box_features(facet: &Facet, from: Projection, to: Projection) -> Vec<GeoJsonFeature> {
    facet
        .boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| b.count > 0)
        .map(|(index, b)| {
            let id = b.id.clone().unwrap_or_else(|| format!("feature{index}"));
            let at = transform(b.center(), from, to);
            GeoJsonFeature::new(
                id.clone(),
                GeoJsonGeometry::point(at),
                properties(json!({
                    "label": b.label.clone().unwrap_or_default(),
                    "id": id,
                    "layer": "primary",
                    "count": b.count,
                    "uri": b.uri,
                })),
            )
        })
        .collect()
}

/// Points at the centre of every non-empty box of `facets[facet_name]`.
pub fn convert_facet_to_geojson(facets: &Facets, facet_name: &str) -> GeoJson {
    let features = facets
        .get(facet_name)
        .map(|facet| box_features(facet, Projection::Epsg4326, Projection::Epsg3857))
        .unwrap_or_default();
    GeoJson::feature_collection(features)
}

/// The named facets present in `facets`, coloured in order.
pub fn get_geo_facets(facets: &Facets, names: &[String]) -> Vec<GeoFacet> {
    names
        .iter()
        .filter_map(|name| facets.get(name).map(|facet| (name, facet)))
        .enumerate()
        .map(|(index, (name, facet))| GeoFacet {
            name: name.clone(),
            facet: facet.clone(),
            color: palette_color(index).to_string(),
        })
        .collect()
}

/// One collection per geo facet. Box facets become centre points, feature
/// facets keep their geometries; both are reprojected from
/// `data_projection` to `map_projection` and tagged with the facet's
/// `layer` and `color`.
pub fn convert_geo_facets_to_geojson(
    geo_facets: &[GeoFacet],
    data_projection: Projection,
    map_projection: Projection,
) -> Vec<GeoJson> {
    geo_facets
        .iter()
        .map(|geo| {
            let mut features = if geo.facet.boxes.is_empty() {
                geo.facet
                    .features
                    .iter()
                    .map(|f| reproject(f, data_projection, map_projection))
                    .collect()
            } else {
                box_features(&geo.facet, data_projection, map_projection)
            };
            for feature in &mut features {
                let props = feature.properties.get_or_insert_with(Properties::new);
                props.insert("layer".to_string(), Value::from(geo.name.clone()));
                props.insert("color".to_string(), Value::from(geo.color.clone()));
            }
            GeoJson::feature_collection(features)
        })
        .collect()
}

fn reproject(feature: &GeoJsonFeature, from: Projection, to: Projection) -> GeoJsonFeature {
    let mut feature = feature.clone();
    if from != to {
        if let Some(geometry) = &mut feature.geometry {
            reproject_geometry(geometry, from, to);
        }
    }
    feature
}

fn reproject_geometry(geometry: &mut GeoJsonGeometry, from: Projection, to: Projection) {
    let apply = |c: &mut [f64; 2]| *c = transform(Coordinate::from(*c), from, to).to_array();
    match geometry {
        GeoJsonGeometry::Point { coordinates } => apply(coordinates),
        GeoJsonGeometry::LineString { coordinates }
        | GeoJsonGeometry::MultiPoint { coordinates } => coordinates.iter_mut().for_each(apply),
        GeoJsonGeometry::Polygon { coordinates }
        | GeoJsonGeometry::MultiLineString { coordinates } => {
            coordinates.iter_mut().flatten().for_each(apply)
        }
        GeoJsonGeometry::MultiPolygon { coordinates } => {
            coordinates.iter_mut().flatten().flatten().for_each(apply)
        }
        GeoJsonGeometry::GeometryCollection { geometries } => {
            for g in geometries {
                reproject_geometry(g, from, to);
            }
        }
    }
}

fn parse_degrees(value: &Value, what: &str) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MapError::InvalidCoordinates(format!("{what} '{s}'"))),
        other => Err(MapError::InvalidCoordinates(format!("{what} {other}"))),
    }
}

/// A single point from the `latitude` / `longitude` props, which may be
/// numbers or numeric strings. Either missing gives an empty collection.
pub fn convert_props_to_geojson(props: &Value) -> Result<GeoJson> {
    let latitude = parse_degrees(props.get("latitude").unwrap_or(&Value::Null), "latitude")?;
    let longitude = parse_degrees(props.get("longitude").unwrap_or(&Value::Null), "longitude")?;
    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return Ok(GeoJson::empty());
    };

    let id = props.get("id").and_then(Value::as_str);
    let label = props.get("label").and_then(Value::as_str).unwrap_or_default();
    let feature = GeoJsonFeature::new(
        id.unwrap_or("feature-supplier"),
        GeoJsonGeometry::point(from_lon_lat(Coordinate::new(lon, lat))),
        properties(json!({
            "name": label,
            "id": id.unwrap_or("feature-1"),
            "layer": "primary",
        })),
    );
    Ok(GeoJson::feature_collection(vec![feature]))
}

/// Points from `"lat,lng"` strings. Entries that do not split into exactly
/// two parts are skipped; parts that are not numbers are an error.
pub fn convert_points_to_geojson<S: AsRef<str>>(points: &[S]) -> Result<GeoJson> {
    let mut features = Vec::new();
    for (index, point) in points.iter().enumerate() {
        let parts: Vec<&str> = point.as_ref().split(',').collect();
        let [lat, lng] = parts[..] else {
            log::debug!("skipping point '{}'", point.as_ref());
            continue;
        };
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| MapError::InvalidCoordinates(point.as_ref().to_string()))
        };
        let at = from_lon_lat(Coordinate::new(parse(lng)?, parse(lat)?));
        let id = format!("component{index}");
        features.push(GeoJsonFeature::new(
            id.clone(),
            GeoJsonGeometry::point(at),
            properties(json!({"name": "", "id": id, "layer": "component"})),
        ));
    }
    Ok(GeoJson::feature_collection(features))
}
