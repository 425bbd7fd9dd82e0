//! Geographic bounds reported to the search callbacks.
//!
//! Map geometries are converted back to the data projection; circle radii
//! are great-circle lengths in metres.

use geo::HaversineDistance;
use serde::{Deserialize, Serialize};

use crate::core::bounds::{transform_extent, Extent};
use crate::core::geo::{to_lon_lat, transform, Coordinate, Projection};
use crate::engine::feature::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointBounds {
    pub latitude: f64,
    pub longitude: f64,
}

impl PointBounds {
    pub fn from_map(at: Coordinate, map: Projection, data: Projection) -> Self {
        let lon_lat = transform(at, map, data);
        Self {
            latitude: lon_lat.y,
            longitude: lon_lat.x,
        }
    }
}

/// The viewport after a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoxBounds {
    pub fn from_extent(extent: &Extent, map: Projection, data: Projection) -> Self {
        let converted = transform_extent(extent, map, data);
        Self {
            south: converted.min.y,
            west: converted.min.x,
            north: converted.max.y,
            east: converted.max.x,
        }
    }
}

/// A shape drawn by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrawingBounds {
    Circle { radius: f64, point: PointBounds },
    Polygon { point: Vec<PointBounds> },
    Point(PointBounds),
}

/// Great-circle length of the segment `a`-`b` given in `projection`.
fn spherical_length(a: Coordinate, b: Coordinate, projection: Projection) -> f64 {
    let (a, b) = if projection.is_geographic() {
        (a, b)
    } else {
        (to_lon_lat(a), to_lon_lat(b))
    };
    geo::Point::new(a.x, a.y).haversine_distance(&geo::Point::new(b.x, b.y))
}

impl DrawingBounds {
    /// Bounds of a drawn geometry; line strings are never drawn and give
    /// `None`.
    pub fn from_geometry(geometry: &Geometry, map: Projection, data: Projection) -> Option<Self> {
        match geometry {
            Geometry::Point(at) => Some(DrawingBounds::Point(PointBounds::from_map(*at, map, data))),
            Geometry::Circle { center, radius } => {
                let edge = Coordinate::new(center.x, center.y + radius);
                Some(DrawingBounds::Circle {
                    radius: spherical_length(*center, edge, map),
                    point: PointBounds::from_map(*center, map, data),
                })
            }
            Geometry::Polygon(rings) => rings.first().map(|exterior| DrawingBounds::Polygon {
                point: exterior
                    .iter()
                    .map(|at| PointBounds::from_map(*at, map, data))
                    .collect(),
            }),
            Geometry::LineString(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::from_lon_lat;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_bounds_in_data_projection() {
        let at = from_lon_lat(Coordinate::new(-95.79, 34.48));
        let bounds = DrawingBounds::from_geometry(
            &Geometry::Point(at),
            Projection::Epsg3857,
            Projection::Epsg4326,
        );
        let Some(DrawingBounds::Point(point)) = bounds else {
            panic!("expected a point");
        };
        assert_relative_eq!(point.longitude, -95.79, epsilon = 1e-9);
        assert_relative_eq!(point.latitude, 34.48, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_radius_is_spherical() {
        let center = from_lon_lat(Coordinate::new(0.0, 0.0));
        let edge = from_lon_lat(Coordinate::new(0.0, 1.0));
        let circle = Geometry::Circle {
            center,
            radius: edge.y - center.y,
        };
        let Some(DrawingBounds::Circle { radius, point }) =
            DrawingBounds::from_geometry(&circle, Projection::Epsg3857, Projection::Epsg4326)
        else {
            panic!("expected a circle");
        };
        // one degree of latitude
        assert_relative_eq!(radius, 111_195.0, epsilon = 5.0);
        assert_relative_eq!(point.latitude, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polygon_uses_exterior_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let bounds = DrawingBounds::from_geometry(
            &Geometry::Polygon(vec![ring]),
            Projection::Epsg4326,
            Projection::Epsg4326,
        );
        assert!(matches!(bounds, Some(DrawingBounds::Polygon { point }) if point.len() == 4));
    }

    #[test]
    fn test_box_bounds_serialize_by_side() {
        let extent = Extent::from_coords(-10.0, -5.0, 10.0, 5.0);
        let bounds = BoxBounds::from_extent(&extent, Projection::Epsg4326, Projection::Epsg4326);
        assert_eq!(
            serde_json::to_value(bounds).unwrap(),
            serde_json::json!({"south": -5.0, "west": -10.0, "north": 5.0, "east": 10.0})
        );
    }
}
