use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Web Mercator projection constants
const EARTH_RADIUS: f64 = 6378137.0;
const HALF_SIZE: f64 = PI * EARTH_RADIUS;
const MAX_LATITUDE: f64 = 85.0511287798;

/// A position in some projection. For geographic projections `x` is the
/// longitude and `y` the latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        value.to_array()
    }
}

impl From<Coordinate> for geo_types::Coord<f64> {
    fn from(value: Coordinate) -> Self {
        geo_types::Coord {
            x: value.x,
            y: value.y,
        }
    }
}

/// The coordinate reference systems the engine can transform between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Projection {
    /// Geographic longitude/latitude (WGS 84).
    Epsg4326,
    /// Spherical Web Mercator.
    #[default]
    Epsg3857,
}

impl Projection {
    pub fn code(&self) -> &'static str {
        match self {
            Projection::Epsg4326 => "EPSG:4326",
            Projection::Epsg3857 => "EPSG:3857",
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Projection::Epsg4326)
    }

    /// Resolution at zoom 0 for a 256 px tile grid covering the projection extent.
    pub fn max_resolution(&self) -> f64 {
        match self {
            Projection::Epsg4326 => 360.0 / 256.0,
            Projection::Epsg3857 => 2.0 * HALF_SIZE / 256.0,
        }
    }
}

impl FromStr for Projection {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" | "WGS84" | "EPSG:4269" => Ok(Projection::Epsg4326),
            "EPSG:3857" | "EPSG:900913" | "EPSG:102100" | "EPSG:102113" => {
                Ok(Projection::Epsg3857)
            }
            _ => Err(MapError::UnknownProjection(s.to_string())),
        }
    }
}

impl TryFrom<String> for Projection {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Projection> for String {
    fn from(value: Projection) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Transforms a coordinate between two projections.
pub fn transform(coordinate: Coordinate, from: Projection, to: Projection) -> Coordinate {
    match (from, to) {
        (Projection::Epsg4326, Projection::Epsg3857) => lon_lat_to_mercator(coordinate),
        (Projection::Epsg3857, Projection::Epsg4326) => mercator_to_lon_lat(coordinate),
        _ => coordinate,
    }
}

/// Converts a `[lon, lat]` coordinate to Web Mercator.
pub fn from_lon_lat(lon_lat: Coordinate) -> Coordinate {
    lon_lat_to_mercator(lon_lat)
}

/// Converts a Web Mercator coordinate to `[lon, lat]`.
pub fn to_lon_lat(coordinate: Coordinate) -> Coordinate {
    mercator_to_lon_lat(coordinate)
}

fn lon_lat_to_mercator(lon_lat: Coordinate) -> Coordinate {
    let x = EARTH_RADIUS * PI * lon_lat.x / 180.0;
    let y = if lon_lat.y.abs() >= 90.0 {
        HALF_SIZE.copysign(lon_lat.y)
    } else {
        (EARTH_RADIUS * (PI * (lon_lat.y + 90.0) / 360.0).tan().ln()).clamp(-HALF_SIZE, HALF_SIZE)
    };
    Coordinate::new(x, y)
}

fn mercator_to_lon_lat(point: Coordinate) -> Coordinate {
    let lon = 180.0 * point.x / HALF_SIZE;
    let lat = 360.0 * (point.y / EARTH_RADIUS).exp().atan() / PI - 90.0;
    Coordinate::new(lon, lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_lon_lat_matches_known_values() {
        let projected = from_lon_lat(Coordinate::new(3.0, 4.0));
        assert_relative_eq!(projected.x, 333958.4723798207, epsilon = 1e-6);
        assert_relative_eq!(projected.y, 445640.1096560266, epsilon = 1e-6);
    }

    #[test]
    fn test_origin_maps_to_origin() {
        let projected = from_lon_lat(Coordinate::default());
        assert_relative_eq!(projected.x, 0.0);
        assert_relative_eq!(projected.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_stays_close() {
        let lon_lat = Coordinate::new(-95.79, 34.48);
        let back = to_lon_lat(from_lon_lat(lon_lat));
        assert_relative_eq!(back.x, lon_lat.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, lon_lat.y, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_parsing() {
        assert_eq!("EPSG:4326".parse::<Projection>().unwrap(), Projection::Epsg4326);
        assert_eq!("epsg:3857".parse::<Projection>().unwrap(), Projection::Epsg3857);
        assert!(matches!(
            "EPSG:27700".parse::<Projection>(),
            Err(MapError::UnknownProjection(_))
        ));
    }

    #[test]
    fn test_identity_transform() {
        let c = Coordinate::new(12.5, -7.25);
        assert_eq!(transform(c, Projection::Epsg4326, Projection::Epsg4326), c);
    }

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(1.5, 2.0)).unwrap();
        assert_eq!(json, "[1.5,2.0]");
    }
}
