use crate::core::geo::{transform, Coordinate, Projection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Zoom,
    Rotate,
    Attribution,
    FullScreen,
    MousePosition,
}

/// How the mouse position control prints a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateFormat {
    /// `"x, y"` with a fixed number of decimals.
    StringXY { decimals: usize },
    /// A template with `{x}` and `{y}` placeholders.
    Template { template: String, decimals: usize },
}

impl CoordinateFormat {
    pub fn format(&self, c: Coordinate) -> String {
        match self {
            CoordinateFormat::StringXY { decimals } => create_string_xy(c, *decimals),
            CoordinateFormat::Template { template, decimals } => {
                format_template(c, template, *decimals)
            }
        }
    }
}

pub fn create_string_xy(c: Coordinate, decimals: usize) -> String {
    format!("{:.*}, {:.*}", decimals, c.x, decimals, c.y)
}

pub fn format_template(c: Coordinate, template: &str, decimals: usize) -> String {
    template
        .replace("{x}", &format!("{:.*}", decimals, c.x))
        .replace("{y}", &format!("{:.*}", decimals, c.y))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MousePosition {
    pub format: CoordinateFormat,
    /// Projection the pointer coordinate is displayed in.
    pub projection: Projection,
}

impl MousePosition {
    pub fn new(format: CoordinateFormat, projection: Projection) -> Self {
        Self { format, projection }
    }

    /// Text shown for a pointer at `coordinate` in the view projection.
    pub fn display(&self, coordinate: Coordinate, view_projection: Projection) -> String {
        self.format
            .format(transform(coordinate, view_projection, self.projection))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Zoom,
    Rotate,
    Attribution,
    FullScreen,
    MousePosition(MousePosition),
}

impl Control {
    pub fn kind(&self) -> ControlKind {
        match self {
            Control::Zoom => ControlKind::Zoom,
            Control::Rotate => ControlKind::Rotate,
            Control::Attribution => ControlKind::Attribution,
            Control::FullScreen => ControlKind::FullScreen,
            Control::MousePosition(_) => ControlKind::MousePosition,
        }
    }
}

/// Zoom buttons, rotation reset and attribution.
pub fn default_controls() -> Vec<Control> {
    vec![Control::Zoom, Control::Rotate, Control::Attribution]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::from_lon_lat;

    #[test]
    fn test_string_xy() {
        assert_eq!(create_string_xy(Coordinate::new(1.23456, -7.0), 4), "1.2346, -7.0000");
    }

    #[test]
    fn test_template_in_data_projection() {
        let control = MousePosition::new(
            CoordinateFormat::Template {
                template: "lat: {y}, lng: {x}".to_string(),
                decimals: 4,
            },
            Projection::Epsg4326,
        );
        let text = control.display(from_lon_lat(Coordinate::new(3.0, 4.0)), Projection::Epsg3857);
        assert_eq!(text, "lat: 4.0000, lng: 3.0000");
    }
}
