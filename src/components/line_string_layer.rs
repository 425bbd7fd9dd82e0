use std::cell::RefCell;
use std::rc::Rc;

use crate::components::context::MapContext;
use crate::components::deps::{EffectDeps, PropRef};
use crate::components::Component;
use crate::core::constants::{
    ARROW_ICON_SCALE, DEFAULT_ARROW_COLOR, DEFAULT_ARROW_SIZE, DEFAULT_DATA_PROJECTION,
    DEFAULT_LINE_COLOR, DEFAULT_LINE_WIDTH, LINE_STRING_FEATURE_TYPE,
};
use crate::core::geo::{transform, Projection};
use crate::data::records::FeatureRecord;
use crate::engine::feature::{Feature, Geometry, Payload};
use crate::engine::layer::Layer;
use crate::engine::style::{Icon, Image, Stroke, Style, StyleFunction};
use crate::engine::vector::{LayerSource, VectorLayer, VectorSource};
use crate::engine::{Handle, MapHandle};
use crate::traits::Configurable;
use crate::Result;

const ARROWHEAD_PATH: &str = "m383.14099,226.420068c0,-7.933762 -3.521484,-15.869483 -10.548501,-21.920508l-221.347637,-190.414199c-14.080238,-12.11283 -36.908931,-12.11283 -50.983474,0c-14.074542,12.10793 -14.074542,31.742887 0,43.856697l195.857609,168.47801l-195.843938,168.48487c-14.074542,12.10793 -14.074542,31.745827 0,43.852777c14.074542,12.118711 36.8964,12.118711 50.976638,0l221.348776,-190.411259c7.025878,-6.053965 10.540526,-13.989687 10.540526,-21.926388z";

/// Inline SVG arrowhead pointing along +x.
pub fn arrowhead_svg(color: &str, width: u32, height: u32) -> String {
    format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n <g>\n   <path fill=\"{color}\" d=\"{ARROWHEAD_PATH}\"/>\n </g>\n</svg>"
    )
}

/// Icon source for [`arrowhead_svg`].
pub fn arrowhead_src(color: &str, width: u32, height: u32) -> String {
    format!("data:image/svg+xml,{}", arrowhead_svg(color, width, height))
}

#[derive(Debug, Clone)]
pub struct LineStringLayerProps {
    /// Ordered path vertices.
    pub features: Option<PropRef<Vec<FeatureRecord>>>,
    pub layer_name: String,
    pub line_color: String,
    pub line_width: f64,
    /// Projection of the record coordinates.
    pub projection: String,
    pub arrows: bool,
    pub arrow_color: String,
    /// Arrow image size in pixels.
    pub width: u32,
    pub height: u32,
    pub hidden: bool,
}

impl Default for LineStringLayerProps {
    fn default() -> Self {
        Self {
            features: None,
            layer_name: "line-string".to_string(),
            line_color: DEFAULT_LINE_COLOR.to_string(),
            line_width: DEFAULT_LINE_WIDTH,
            projection: DEFAULT_DATA_PROJECTION.to_string(),
            arrows: false,
            arrow_color: DEFAULT_ARROW_COLOR.to_string(),
            width: DEFAULT_ARROW_SIZE,
            height: DEFAULT_ARROW_SIZE,
            hidden: false,
        }
    }
}

impl LineStringLayerProps {
    pub fn with_features(mut self, features: PropRef<Vec<FeatureRecord>>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_line(mut self, color: impl Into<String>, width: f64) -> Self {
        self.line_color = color.into();
        self.line_width = width;
        self
    }

    pub fn with_arrows(mut self, arrows: bool) -> Self {
        self.arrows = arrows;
        self
    }

    pub fn with_arrow_color(mut self, color: impl Into<String>) -> Self {
        self.arrow_color = color.into();
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// What the style function reads on every call.
#[derive(Debug, Clone, PartialEq)]
struct LineSettings {
    line_color: String,
    line_width: f64,
    arrows: bool,
    arrow_src: String,
}

fn line_styles(feature: &Feature, settings: &LineSettings) -> Vec<Style> {
    let mut styles = vec![Style::new().with_stroke(Stroke::new(
        settings.line_color.clone(),
        settings.line_width,
    ))];
    if !settings.arrows {
        return styles;
    }
    let Some(geometry) = feature.geometry() else {
        return styles;
    };
    for (start, end) in geometry.segments() {
        let rotation = (end.y - start.y).atan2(end.x - start.x);
        let mut icon = Icon::new(settings.arrow_src.clone());
        icon.rotate_with_view = true;
        icon.rotation = -rotation;
        icon.scale = ARROW_ICON_SCALE;
        styles.push(
            Style::new()
                .with_geometry(Geometry::Point(end))
                .with_image(Image::Icon(icon)),
        );
    }
    styles
}

struct Attached {
    map: MapHandle,
    layer: Handle<VectorLayer>,
    source: Handle<VectorSource>,
}

/// One path through an ordered list of records, optionally with arrows.
pub struct LineStringLayer {
    props: LineStringLayerProps,
    settings: Rc<RefCell<LineSettings>>,
    attached: Option<Attached>,
    arrow_deps: EffectDeps<(String, u32, u32)>,
    map_deps: EffectDeps<Option<u64>>,
    feature_deps: EffectDeps<Option<PropRef<Vec<FeatureRecord>>>>,
    visibility_deps: EffectDeps<bool>,
}

impl LineStringLayer {
    pub fn new(props: LineStringLayerProps) -> Self {
        let settings = LineSettings {
            line_color: props.line_color.clone(),
            line_width: props.line_width,
            arrows: props.arrows,
            arrow_src: String::new(),
        };
        Self {
            props,
            settings: Rc::new(RefCell::new(settings)),
            attached: None,
            arrow_deps: EffectDeps::new(),
            map_deps: EffectDeps::new(),
            feature_deps: EffectDeps::new(),
            visibility_deps: EffectDeps::new(),
        }
    }

    pub fn layer(&self) -> Option<&Handle<VectorLayer>> {
        self.attached.as_ref().map(|a| &a.layer)
    }

    pub fn source(&self) -> Option<&Handle<VectorSource>> {
        self.attached.as_ref().map(|a| &a.source)
    }

    /// Current arrow icon source.
    pub fn arrow_src(&self) -> String {
        self.settings.borrow().arrow_src.clone()
    }

    fn attach(&mut self, map: MapHandle) -> Result<()> {
        log::debug!("creating line string layer '{}'", self.props.layer_name);
        let source = Handle::new(VectorSource::new());
        let settings = Rc::clone(&self.settings);
        let style: StyleFunction = Rc::new(move |feature: &Feature, _resolution: f64| {
            line_styles(feature, &settings.borrow())
        });
        let layer = Handle::new(
            VectorLayer::new(
                self.props.layer_name.clone(),
                LayerSource::Vector(source.clone()),
            )
            .with_style(style),
        );
        map.borrow_mut().add_layer(layer.as_layer())?;

        self.attached = Some(Attached { map, layer, source });
        self.feature_deps.reset();
        self.visibility_deps.reset();
        Ok(())
    }

    fn detach(&mut self, clear: bool) {
        if let Some(attached) = self.attached.take() {
            log::debug!("removing line string layer '{}'", self.props.layer_name);
            if clear {
                attached.source.clear();
            }
            attached.map.borrow_mut().remove_layer(attached.layer.id());
        }
    }

    fn build_path(&self, attached: &Attached) -> Result<()> {
        if attached.source.borrow().revision() > 0 {
            log::debug!("clearing line string features");
            attached.source.clear();
        }
        let Some(points) = &self.props.features else {
            return Ok(());
        };
        log::debug!("building path through {} points", points.len());

        let data_projection: Projection = self.props.projection.parse()?;
        let view_projection = attached.map.borrow().view().projection();
        let coordinates = points
            .iter()
            .map(|p| transform(p.lon_lat(), data_projection, view_projection))
            .collect();
        let feature = Feature::new(Geometry::LineString(coordinates))
            .with_feature_type(LINE_STRING_FEATURE_TYPE)
            .with_payload(Payload::Path(Rc::clone(points.as_rc())))
            .into_ref();
        attached.source.add_feature(feature);
        Ok(())
    }
}

impl Component for LineStringLayer {
    fn name(&self) -> &str {
        &self.props.layer_name
    }

    fn render(&mut self, ctx: &MapContext) -> Result<()> {
        {
            let mut settings = self.settings.borrow_mut();
            settings.line_color = self.props.line_color.clone();
            settings.line_width = self.props.line_width;
            settings.arrows = self.props.arrows;
        }

        let arrow = (
            self.props.arrow_color.clone(),
            self.props.width,
            self.props.height,
        );
        if self.arrow_deps.changed(arrow) {
            self.settings.borrow_mut().arrow_src =
                arrowhead_src(&self.props.arrow_color, self.props.width, self.props.height);
        }

        let map = ctx.map();
        if self.map_deps.changed(map.as_ref().map(Handle::id)) {
            self.detach(false);
            if let Some(map) = map {
                self.attach(map)?;
            }
        }

        let Some(attached) = &self.attached else {
            return Ok(());
        };

        if self.feature_deps.changed(self.props.features.clone()) {
            self.build_path(attached)?;
        }

        if self.visibility_deps.changed(self.props.hidden) {
            attached.layer.borrow_mut().set_visible(!self.props.hidden);
        }
        Ok(())
    }

    fn unmount(&mut self, _ctx: &MapContext) -> Result<()> {
        self.detach(true);
        self.map_deps.reset();
        Ok(())
    }
}

impl Configurable for LineStringLayer {
    type Config = LineStringLayerProps;

    fn config(&self) -> &LineStringLayerProps {
        &self.props
    }

    fn set_config(&mut self, config: LineStringLayerProps) -> Result<()> {
        Self::validate_config(&config)?;
        self.props = config;
        Ok(())
    }

    fn validate_config(config: &LineStringLayerProps) -> Result<()> {
        config.projection.parse::<Projection>().map(|_| ())
    }
}
