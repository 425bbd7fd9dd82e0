use std::rc::Rc;

use serde_json::Value;

use crate::core::color::transparent_fill;
use crate::core::constants::DEFAULT_MARKER_COLOR;
use crate::engine::feature::{Feature, Geometry};
use crate::engine::style::{CircleStyle, Fill, Image, Stroke, Style, StyleFunction, Text};

pub fn point_marker(color: &str) -> Style {
    Style::new().with_image(Image::Circle(
        CircleStyle::new(6.0)
            .with_stroke(Stroke::new(color, 4.0))
            .with_fill(Fill::new(transparent_fill(color))),
    ))
}

pub fn line_marker(color: &str) -> Style {
    Style::new().with_stroke(Stroke::new(color, 12.0))
}

pub fn polygon_marker(color: &str) -> Style {
    Style::new()
        .with_stroke(Stroke::new(color, 4.0))
        .with_fill(Fill::new(transparent_fill(color)))
}

pub fn circle_marker(color: &str) -> Style {
    polygon_marker(color)
}

fn cluster_text(text: String) -> Text {
    let mut label = Text::new(text)
        .with_font("14px Arial")
        .with_fill(Fill::new("black"));
    label.text_align = Some("center".to_string());
    label.text_baseline = Some("middle".to_string());
    label
}

/// Dashed ring sized by the number of digits in `count`.
pub fn cluster_marker(color: &str, count: u64) -> Style {
    let count = count.to_string();
    let digits = count.len() as f64;
    Style::new()
        .with_image(Image::Circle(
            CircleStyle::new(5.0 + digits * 5.0)
                .with_fill(Fill::new(transparent_fill(color)))
                .with_stroke(Stroke::new(color, digits).with_line_dash(vec![4.0])),
        ))
        .with_text(cluster_text(count))
}

/// Marker for a facet feature from its `count`, `color` and geometry.
pub fn feature_marker(feature: &Feature) -> Style {
    let count = feature.get("count").and_then(Value::as_u64).unwrap_or(0);
    let color = feature
        .get("color")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MARKER_COLOR);

    if count > 1 {
        return cluster_marker(color, count);
    }
    match feature.geometry() {
        Some(Geometry::Point(_)) => point_marker(color),
        Some(Geometry::LineString(_)) => line_marker(color),
        Some(Geometry::Polygon(_)) => polygon_marker(color),
        Some(Geometry::Circle { .. }) => circle_marker(color),
        None => point_marker(DEFAULT_MARKER_COLOR),
    }
}

pub fn feature_marker_style() -> StyleFunction {
    Rc::new(|feature: &Feature, _resolution: f64| vec![feature_marker(feature)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Coordinate;

    fn point(properties: Value) -> Feature {
        let Value::Object(properties) = properties else {
            unreachable!()
        };
        Feature::new(Geometry::Point(Coordinate::default())).with_properties(properties)
    }

    #[test]
    fn test_cluster_marker_grows_with_digits() {
        let style = feature_marker(&point(serde_json::json!({"count": 120, "color": "red"})));
        let Some(Image::Circle(circle)) = &style.image else {
            panic!("expected a circle");
        };
        assert_eq!(circle.radius, 20.0);
        let stroke = circle.stroke.as_ref().unwrap();
        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.line_dash, Some(vec![4.0]));
        assert_eq!(style.text().unwrap().text.as_deref(), Some("120"));
    }

    #[test]
    fn test_single_point_uses_half_transparent_fill() {
        let style = feature_marker(&point(serde_json::json!({"count": 1, "color": "red"})));
        let Some(Image::Circle(circle)) = &style.image else {
            panic!("expected a circle");
        };
        assert_eq!(circle.radius, 6.0);
        assert_eq!(circle.fill.as_ref().unwrap().color, transparent_fill("red"));
    }

    #[test]
    fn test_line_marker_and_default_color() {
        let line = Feature::new(Geometry::LineString(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
        ]));
        let style = feature_marker(&line);
        let stroke = style.stroke.unwrap();
        assert_eq!(stroke.width, 12.0);
        assert_eq!(stroke.color, DEFAULT_MARKER_COLOR);
    }
}
