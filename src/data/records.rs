//! Caller-supplied feature records
//!
//! Records are opaque JSON objects. The only structure the library relies on
//! is the position, the `type` attribute used for style lookup, and a
//! display name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(Value);

impl FeatureRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The record's `type` attribute.
    pub fn type_key(&self) -> Option<String> {
        match self.0.get("type")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// `properties.name`, falling back to a top-level `name`.
    pub fn display_name(&self) -> Option<String> {
        self.0
            .get("properties")
            .and_then(|p| p.get("name"))
            .or_else(|| self.0.get("name"))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
    }

    /// Position as `[lon, lat]` in the record's own projection.
    ///
    /// A bare `[lon, lat]` array is used as is. Otherwise the position object
    /// is `geometry`, falling back to `location` and then to the record
    /// itself; its `coordinates` pair wins, then `long`/`longitude` and
    /// `lat`/`latitude`. Anything missing reads as zero.
    pub fn lon_lat(&self) -> Coordinate {
        if let Some(pair) = coordinate_pair(&self.0) {
            return pair;
        }
        let geo = non_null(self.0.get("geometry"))
            .or_else(|| non_null(self.0.get("location")))
            .unwrap_or(&self.0);
        if let Some(pair) = geo.get("coordinates").and_then(coordinate_pair) {
            return pair;
        }
        Coordinate::new(
            first_number(geo, &["long", "longitude"]),
            first_number(geo, &["lat", "latitude"]),
        )
    }
}

impl From<Value> for FeatureRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coordinate_pair(value: &Value) -> Option<Coordinate> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    Some(Coordinate::new(
        number(&items[0]).unwrap_or(0.0),
        number(&items[1]).unwrap_or(0.0),
    ))
}

/// First non-zero value among `keys`, else zero.
fn first_number(value: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(number))
        .find(|v| *v != 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lon_lat(value: Value) -> [f64; 2] {
        FeatureRecord::new(value).lon_lat().to_array()
    }

    #[test]
    fn test_geometry_coordinates_win() {
        assert_eq!(
            lon_lat(json!({
                "geometry": {"coordinates": [1.0, 2.0], "long": 9.0, "lat": 9.0},
                "location": {"coordinates": [5.0, 6.0]}
            })),
            [1.0, 2.0]
        );
    }

    #[test]
    fn test_location_used_without_geometry() {
        assert_eq!(lon_lat(json!({"location": {"coordinates": [5.0, 6.0]}})), [5.0, 6.0]);
        assert_eq!(lon_lat(json!({"geometry": null, "location": {"lat": 3, "long": 4}})), [4.0, 3.0]);
    }

    #[test]
    fn test_long_lat_aliases() {
        assert_eq!(lon_lat(json!({"geometry": {"longitude": 7.5, "latitude": -1.5}})), [7.5, -1.5]);
        assert_eq!(lon_lat(json!({"geometry": {"long": 0, "longitude": 8, "lat": "2.5"}})), [8.0, 2.5]);
    }

    #[test]
    fn test_missing_position_defaults_to_origin() {
        assert_eq!(lon_lat(json!({"geometry": {}})), [0.0, 0.0]);
        assert_eq!(lon_lat(json!({"name": "nowhere"})), [0.0, 0.0]);
        assert_eq!(lon_lat(json!({"geometry": {"lat": 4}})), [0.0, 4.0]);
    }

    #[test]
    fn test_top_level_lat_long() {
        assert_eq!(lon_lat(json!({"lat": 5, "long": 6})), [6.0, 5.0]);
        assert_eq!(lon_lat(json!({"latitude": "1.5", "longitude": -3})), [-3.0, 1.5]);
        // a position object hides the record's own fields
        assert_eq!(
            lon_lat(json!({"geometry": {"coordinates": [10, 20]}, "lat": 5, "long": 6})),
            [10.0, 20.0]
        );
    }

    #[test]
    fn test_bare_pair() {
        assert_eq!(lon_lat(json!([10.0, 20.0])), [10.0, 20.0]);
    }

    #[test]
    fn test_display_name_and_type() {
        let record = FeatureRecord::new(json!({"type": "Foo", "name": "top", "properties": {"name": "inner"}}));
        assert_eq!(record.type_key().as_deref(), Some("Foo"));
        assert_eq!(record.display_name().as_deref(), Some("inner"));

        let record = FeatureRecord::new(json!({"name": "top"}));
        assert_eq!(record.display_name().as_deref(), Some("top"));
        assert_eq!(record.type_key(), None);
    }
}
