//! Click popup content for the search map.

use serde_json::Value;

use crate::engine::feature::FeatureRef;

/// Properties never listed in the popup: backend bookkeeping and the
/// properties the map itself sets.
pub const HIDDEN_PROPERTIES: [&str; 8] = [
    "OBJECTID", "LABEL", "DBID", "layer", "label", "id", "color", "geometry",
];

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Features grouped by their `layer` property, in first-seen order.
/// Features without a layer are dropped.
pub fn group_by_layer(features: &[FeatureRef]) -> Vec<(String, Vec<FeatureRef>)> {
    let mut groups: Vec<(String, Vec<FeatureRef>)> = Vec::new();
    for feature in features {
        let Some(layer) = feature.get("layer").and_then(Value::as_str) else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| name == layer) {
            Some((_, members)) => members.push(FeatureRef::clone(feature)),
            None => groups.push((layer.to_string(), vec![FeatureRef::clone(feature)])),
        }
    }
    groups
}

fn feature_html(feature: &FeatureRef) -> String {
    let color = feature.get("color").map(display).unwrap_or_default();
    let label = feature.get("label").map(display).unwrap_or_default();
    let items: String = feature
        .properties()
        .iter()
        .filter(|(key, _)| !HIDDEN_PROPERTIES.contains(&key.as_str()))
        .map(|(key, value)| format!("<li>{key}: {}</li>", display(value)))
        .collect();
    format!(
        "<div style=\"overflow: auto\"><strong><b style=\"color: {color}\">&#9673;</b>&nbsp;{label}</strong><ul style=\"max-height: 200px;\">{items}</ul></div>"
    )
}

/// Popup HTML for the features under a click, empty when none of them
/// belongs to a layer.
pub fn popup_html(features: &[FeatureRef]) -> String {
    group_by_layer(features)
        .iter()
        .flat_map(|(_, members)| members.iter().map(feature_html))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Coordinate;
    use crate::engine::feature::{Feature, Geometry};
    use serde_json::json;

    fn feature(properties: Value) -> FeatureRef {
        let Value::Object(properties) = properties else {
            unreachable!()
        };
        Feature::new(Geometry::Point(Coordinate::default()))
            .with_properties(properties)
            .into_ref()
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let features = vec![
            feature(json!({"layer": "b", "label": "1"})),
            feature(json!({"layer": "a", "label": "2"})),
            feature(json!({"label": "orphan"})),
            feature(json!({"layer": "b", "label": "3"})),
        ];
        let groups = group_by_layer(&features);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a");
    }

    #[test]
    fn test_hidden_properties_are_not_listed() {
        let html = popup_html(&[feature(json!({
            "layer": "geo", "label": "Texas", "color": "red", "id": "x",
            "OBJECTID": 7, "count": 5, "uri": "urn:tx"
        }))]);
        assert!(html.contains("<b style=\"color: red\">&#9673;</b>&nbsp;Texas"));
        assert!(html.contains("<li>count: 5</li>"));
        assert!(html.contains("<li>uri: urn:tx</li>"));
        assert!(!html.contains("OBJECTID"));
        assert!(!html.contains("<li>id:"));
    }

    #[test]
    fn test_no_layer_no_content() {
        assert!(popup_html(&[feature(json!({"label": "x"}))]).is_empty());
    }
}
