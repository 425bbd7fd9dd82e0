use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::feature::{Feature, Geometry};

/// Computes the styles of a feature at a resolution.
pub type StyleFunction = Rc<dyn Fn(&Feature, f64) -> Vec<Style>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub color: String,
}

impl Fill {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub color: String,
    #[serde(default = "default_stroke_width")]
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_dash: Option<Vec<f64>>,
}

fn default_stroke_width() -> f64 {
    1.0
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            line_dash: None,
        }
    }

    pub fn with_line_dash(mut self, dash: Vec<f64>) -> Self {
        self.line_dash = Some(dash);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Text {
    pub text: Option<String>,
    pub font: Option<String>,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub text_align: Option<String>,
    pub text_baseline: Option<String>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation: f64,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub radius: f64,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

impl CircleStyle {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            fill: None,
            stroke: None,
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub src: String,
    pub anchor: [f64; 2],
    pub rotate_with_view: bool,
    /// Radians, clockwise.
    pub rotation: f64,
    pub scale: f64,
}

impl Icon {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            anchor: [0.5, 0.5],
            rotate_with_view: false,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Circle(CircleStyle),
    Icon(Icon),
}

/// Rendering instructions for one feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub image: Option<Image>,
    pub text: Option<Text>,
    /// Geometry drawn instead of the feature's own.
    pub geometry: Option<Geometry>,
    pub z_index: Option<i32>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's stand-in style for features nothing else styles.
    pub fn neutral() -> Self {
        let fill = Fill::new("rgba(255,255,255,0.4)");
        let stroke = Stroke::new("#3399CC", 1.25);
        Self {
            fill: Some(fill.clone()),
            stroke: Some(stroke.clone()),
            image: Some(Image::Circle(
                CircleStyle::new(5.0).with_fill(fill).with_stroke(stroke),
            )),
            ..Default::default()
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_text(mut self, text: Text) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn text(&self) -> Option<&Text> {
        self.text.as_ref()
    }

    pub fn text_mut(&mut self) -> Option<&mut Text> {
        self.text.as_mut()
    }
}
