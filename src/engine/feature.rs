use std::rc::Rc;

use serde_json::Value;

use crate::core::bounds::Extent;
use crate::core::constants::CLUSTER_FEATURE_TYPE;
use crate::core::geo::{transform, Coordinate, Projection};
use crate::data::records::FeatureRecord;
use crate::engine::next_id;

pub type FeatureRef = Rc<Feature>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Rings, the first being the exterior.
    Polygon(Vec<Vec<Coordinate>>),
    Circle { center: Coordinate, radius: f64 },
}

impl Geometry {
    pub fn geometry_type(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::Circle { .. } => "Circle",
        }
    }

    pub fn extent(&self) -> Extent {
        match self {
            Geometry::Point(c) => Extent::new(*c, *c),
            Geometry::LineString(coords) => {
                Extent::from_coordinates(coords).unwrap_or_default()
            }
            Geometry::Polygon(rings) => {
                Extent::from_coordinates(rings.iter().flatten()).unwrap_or_default()
            }
            Geometry::Circle { center, radius } => Extent::new(*center, *center).buffered(*radius),
        }
    }

    /// Where an overlay attached to this geometry is placed.
    pub fn anchor(&self) -> Coordinate {
        match self {
            Geometry::Point(c) => *c,
            Geometry::Circle { center, .. } => *center,
            _ => self.extent().center(),
        }
    }

    /// Consecutive vertex pairs of a line string.
    pub fn segments(&self) -> Vec<(Coordinate, Coordinate)> {
        match self {
            Geometry::LineString(coords) => coords.windows(2).map(|w| (w[0], w[1])).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `point` lies on the geometry within `tolerance` map units.
    pub fn hit(&self, point: &Coordinate, tolerance: f64) -> bool {
        match self {
            Geometry::Point(c) => c.distance_to(point) <= tolerance,
            Geometry::LineString(_) => self
                .segments()
                .iter()
                .any(|(a, b)| segment_distance(point, a, b) <= tolerance),
            Geometry::Polygon(rings) => {
                let Some(exterior) = rings.first() else {
                    return false;
                };
                ring_contains(exterior, point)
                    || exterior
                        .windows(2)
                        .any(|w| segment_distance(point, &w[0], &w[1]) <= tolerance)
            }
            Geometry::Circle { center, radius } => center.distance_to(point) <= radius + tolerance,
        }
    }

    pub fn transformed(&self, from: Projection, to: Projection) -> Geometry {
        if from == to {
            return self.clone();
        }
        let t = |c: &Coordinate| transform(*c, from, to);
        match self {
            Geometry::Point(c) => Geometry::Point(t(c)),
            Geometry::LineString(coords) => Geometry::LineString(coords.iter().map(t).collect()),
            Geometry::Polygon(rings) => {
                Geometry::Polygon(rings.iter().map(|r| r.iter().map(t).collect()).collect())
            }
            Geometry::Circle { center, radius } => Geometry::Circle {
                center: t(center),
                radius: *radius,
            },
        }
    }
}

fn segment_distance(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance_to(&Coordinate::new(a.x + t * dx, a.y + t * dy))
}

fn ring_contains(ring: &[Coordinate], p: &Coordinate) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Data a feature was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(FeatureRecord),
    /// The ordered records a line string was built from.
    Path(Rc<Vec<FeatureRecord>>),
}

impl Payload {
    pub fn as_record(&self) -> Option<&FeatureRecord> {
        match self {
            Payload::Record(r) => Some(r),
            Payload::Path(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&Rc<Vec<FeatureRecord>>> {
        match self {
            Payload::Path(p) => Some(p),
            Payload::Record(_) => None,
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.as_record().and_then(FeatureRecord::display_name)
    }
}

/// A map feature. Aggregates produced by clustering carry their members in
/// [`Feature::features`].
#[derive(Debug, Clone)]
pub struct Feature {
    id: u64,
    geometry: Option<Geometry>,
    feature_type: Option<String>,
    type_key: Option<String>,
    payload: Option<Payload>,
    features: Vec<FeatureRef>,
    properties: serde_json::Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: next_id(),
            geometry: Some(geometry),
            feature_type: None,
            type_key: None,
            payload: None,
            features: Vec::new(),
            properties: serde_json::Map::new(),
        }
    }

    /// An aggregate of `members` placed at `geometry`.
    pub fn aggregate(geometry: Geometry, members: Vec<FeatureRef>) -> Self {
        Self {
            features: members,
            ..Self::new(geometry)
        }
    }

    pub fn with_feature_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = Some(feature_type.into());
        self
    }

    pub fn with_type_key(mut self, type_key: Option<String>) -> Self {
        self.type_key = type_key;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_properties(mut self, properties: serde_json::Map<String, Value>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn into_ref(self) -> FeatureRef {
        Rc::new(self)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn feature_type(&self) -> Option<&str> {
        self.feature_type.as_deref()
    }

    /// The `type` attribute used to look up a style.
    pub fn type_key(&self) -> Option<&str> {
        self.type_key.as_deref()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn features(&self) -> &[FeatureRef] {
        &self.features
    }

    pub fn is_aggregate(&self) -> bool {
        !self.features.is_empty()
    }

    /// Feature type used for filtering: a single-member aggregate reports its
    /// member's type, a larger one reports `"cluster"`.
    pub fn effective_feature_type(&self) -> Option<&str> {
        match self.features.len() {
            0 => self.feature_type(),
            1 => self.features[0].feature_type(),
            _ => Some(CLUSTER_FEATURE_TYPE),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &serde_json::Map<String, Value> {
        &self.properties
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effective_feature_type() {
        let child = Feature::new(Geometry::Point(Coordinate::default()))
            .with_feature_type("station")
            .into_ref();
        let single = Feature::aggregate(Geometry::Point(Coordinate::default()), vec![child.clone()]);
        assert_eq!(single.effective_feature_type(), Some("station"));

        let pair = Feature::aggregate(
            Geometry::Point(Coordinate::default()),
            vec![child.clone(), child],
        );
        assert_eq!(pair.effective_feature_type(), Some("cluster"));

        let plain = Feature::new(Geometry::Point(Coordinate::default())).with_feature_type("point");
        assert_eq!(plain.effective_feature_type(), Some("point"));
    }

    #[test]
    fn test_geometry_hits() {
        let line = Geometry::LineString(vec![Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 0.0)]);
        assert!(line.hit(&Coordinate::new(5.0, 0.5), 1.0));
        assert!(!line.hit(&Coordinate::new(5.0, 3.0), 1.0));

        let square = Geometry::Polygon(vec![vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(4.0, 0.0),
            Coordinate::new(4.0, 4.0),
            Coordinate::new(0.0, 4.0),
            Coordinate::new(0.0, 0.0),
        ]]);
        assert!(square.hit(&Coordinate::new(2.0, 2.0), 0.0));
        assert!(!square.hit(&Coordinate::new(6.0, 2.0), 0.5));

        let circle = Geometry::Circle {
            center: Coordinate::new(1.0, 1.0),
            radius: 2.0,
        };
        assert!(circle.hit(&Coordinate::new(2.5, 1.0), 0.0));
        assert_eq!(circle.extent().to_array(), [-1.0, -1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_payload_display_name() {
        let record = FeatureRecord::new(json!({"properties": {"name": "Depot"}}));
        let feature = Feature::new(Geometry::Point(Coordinate::default()))
            .with_payload(Payload::Record(record));
        assert_eq!(
            feature.payload().and_then(Payload::display_name).as_deref(),
            Some("Depot")
        );
    }
}
