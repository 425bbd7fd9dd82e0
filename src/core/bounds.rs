use crate::core::geo::{transform, Coordinate, Projection};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Extent {
    /// Creates a new extent from two corners
    pub fn new(min: Coordinate, max: Coordinate) -> Self {
        Self { min, max }
    }

    /// Creates an extent from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Coordinate::new(min_x, min_y), Coordinate::new(max_x, max_y))
    }

    /// An extent containing nothing; extending it with a coordinate yields
    /// that coordinate's zero-area extent
    pub fn empty() -> Self {
        Self::from_coords(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        )
    }

    /// Smallest extent covering all coordinates, or `None` when there are none
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut extent = Self::empty();
        for c in coordinates {
            extent.extend(c);
        }
        (!extent.is_empty()).then_some(extent)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    /// Extends the extent to include a point
    pub fn extend(&mut self, point: &Coordinate) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn extend_extent(&mut self, other: &Extent) {
        if !other.is_empty() {
            self.extend(&other.min);
            self.extend(&other.max);
        }
    }

    /// Returns a new extent grown by `amount` on every side
    pub fn buffered(&self, amount: f64) -> Extent {
        Extent::from_coords(
            self.min.x - amount,
            self.min.y - amount,
            self.max.x + amount,
            self.max.y + amount,
        )
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::empty()
    }
}

/// Transforms an extent by projecting its corners. Both supported
/// projections are axis aligned so the corners bound the result.
pub fn transform_extent(extent: &Extent, from: Projection, to: Projection) -> Extent {
    if from == to || extent.is_empty() {
        return *extent;
    }
    let a = transform(extent.min, from, to);
    let b = transform(extent.max, from, to);
    Extent::from_coords(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extent_from_coordinates() {
        let pts = [
            Coordinate::new(1.0, 5.0),
            Coordinate::new(-2.0, 3.0),
            Coordinate::new(4.0, -1.0),
        ];
        let extent = Extent::from_coordinates(&pts).unwrap();
        assert_eq!(extent.to_array(), [-2.0, -1.0, 4.0, 5.0]);
        assert_eq!(extent.center(), Coordinate::new(1.0, 2.0));
        assert!(Extent::from_coordinates(&[]).is_none());
    }

    #[test]
    fn test_single_point_extent_has_zero_area() {
        let extent = Extent::from_coordinates(&[Coordinate::new(3.0, 3.0)]).unwrap();
        assert!(!extent.is_empty());
        assert_eq!(extent.width(), 0.0);
        assert!(extent.contains(&Coordinate::new(3.0, 3.0)));
    }

    #[test]
    fn test_transform_extent_round_trip() {
        let geographic = Extent::from_coords(-10.0, -5.0, 10.0, 5.0);
        let projected =
            transform_extent(&geographic, Projection::Epsg4326, Projection::Epsg3857);
        let back = transform_extent(&projected, Projection::Epsg3857, Projection::Epsg4326);
        assert_relative_eq!(back.min.x, -10.0, epsilon = 1e-9);
        assert_relative_eq!(back.max.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_intersects_and_buffer() {
        let a = Extent::from_coords(0.0, 0.0, 1.0, 1.0);
        let b = Extent::from_coords(1.5, 1.5, 2.0, 2.0);
        assert!(!a.intersects(&b));
        assert!(a.buffered(0.5).intersects(&b));
    }
}
