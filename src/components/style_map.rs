//! Style tables keyed by feature `type`
//!
//! A [`StyleConfig`] is plain data (it deserializes from the same JSON shape
//! a style sheet would be written in); [`parse_style_map`] turns it into
//! engine styles, always as a whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::feature::{Feature, Payload};
use crate::engine::style::{CircleStyle, Fill, Image, Stroke, Style, Text};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircleSpec {
    pub radius: f64,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

/// Style description for one type key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSpec {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    /// Point marker.
    pub circle: Option<CircleSpec>,
    pub text: Option<Text>,
    pub z_index: Option<i32>,
}

impl StyleSpec {
    pub fn to_style(&self) -> Style {
        let image = self.circle.as_ref().map(|circle| {
            let mut marker = CircleStyle::new(circle.radius);
            if let Some(fill) = &circle.fill {
                marker = marker.with_fill(fill.clone());
            }
            if let Some(stroke) = &circle.stroke {
                marker = marker.with_stroke(stroke.clone());
            }
            Image::Circle(marker)
        });
        Style {
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            image,
            text: self.text.clone(),
            geometry: None,
            z_index: self.z_index,
        }
    }
}

pub type StyleConfig = BTreeMap<String, StyleSpec>;

pub type StyleMap = BTreeMap<String, Style>;

pub fn parse_style_map(config: &StyleConfig) -> StyleMap {
    config
        .iter()
        .map(|(key, spec)| (key.clone(), spec.to_style()))
        .collect()
}

/// Sorted key set of a style table.
pub fn style_keys(styles: &StyleMap) -> Vec<String> {
    styles.keys().cloned().collect()
}

/// Style for one rendered feature.
///
/// An aggregate uses the style of its first member's type and shows the
/// member count; anything else uses its own type and shows its payload's
/// display name. The table entry is cloned, never modified. Types without an
/// entry get the neutral style.
pub fn resolve_feature_style(feature: &Feature, styles: &StyleMap) -> Style {
    let (type_key, label) = match feature.features().first() {
        Some(first) => (first.type_key(), Some(feature.features().len().to_string())),
        None => (
            feature.type_key(),
            feature.payload().and_then(Payload::display_name),
        ),
    };

    let Some(style) = type_key.and_then(|key| styles.get(key)) else {
        log::trace!("no style for type {:?}, using the neutral style", type_key);
        return Style::neutral();
    };

    let mut style = style.clone();
    if let Some(text) = style.text_mut() {
        text.text = label;
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Coordinate;
    use crate::data::records::FeatureRecord;
    use crate::engine::feature::Geometry;
    use serde_json::json;

    fn config() -> StyleConfig {
        serde_json::from_value(json!({
            "Foo": {
                "circle": {"radius": 6, "fill": {"color": "red"}},
                "text": {"font": "12px sans-serif", "fill": {"color": "#000"}}
            },
            "Bar": {"stroke": {"color": "blue", "width": 2}}
        }))
        .unwrap()
    }

    fn member(name: &str) -> Feature {
        Feature::new(Geometry::Point(Coordinate::default()))
            .with_type_key(Some("Foo".to_string()))
            .with_payload(Payload::Record(FeatureRecord::new(
                json!({"type": "Foo", "properties": {"name": name}}),
            )))
    }

    #[test]
    fn test_parse_builds_every_key() {
        let styles = parse_style_map(&config());
        assert_eq!(style_keys(&styles), vec!["Bar", "Foo"]);
        let foo = &styles["Foo"];
        assert!(matches!(&foo.image, Some(Image::Circle(c)) if c.radius == 6.0));
        assert_eq!(foo.text().unwrap().font.as_deref(), Some("12px sans-serif"));
        assert_eq!(styles["Bar"].stroke.as_ref().unwrap().width, 2.0);
    }

    #[test]
    fn test_single_feature_shows_name() {
        let styles = parse_style_map(&config());
        let style = resolve_feature_style(&member("A"), &styles);
        assert_eq!(style.text().unwrap().text.as_deref(), Some("A"));
        // the table keeps its own text untouched
        assert_eq!(styles["Foo"].text().unwrap().text, None);
    }

    #[test]
    fn test_cluster_shows_count() {
        let styles = parse_style_map(&config());
        let members = (0..3).map(|i| member(&i.to_string()).into_ref()).collect();
        let cluster = Feature::aggregate(Geometry::Point(Coordinate::default()), members);
        let style = resolve_feature_style(&cluster, &styles);
        assert_eq!(style.text().unwrap().text.as_deref(), Some("3"));
    }

    #[test]
    fn test_style_without_text_is_left_alone() {
        let styles = parse_style_map(&config());
        let bar = Feature::new(Geometry::Point(Coordinate::default()))
            .with_type_key(Some("Bar".to_string()));
        assert!(resolve_feature_style(&bar, &styles).text().is_none());
    }

    #[test]
    fn test_unknown_type_gets_neutral_style() {
        let styles = parse_style_map(&config());
        let other = Feature::new(Geometry::Point(Coordinate::default()))
            .with_type_key(Some("Baz".to_string()));
        assert_eq!(resolve_feature_style(&other, &styles), Style::neutral());
    }
}
