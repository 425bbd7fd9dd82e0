use crate::engine::feature::FeatureRef;
use crate::engine::style::Style;
use crate::engine::Handle;
use crate::prelude::HashMap;
use crate::traits::AsAny;
use crate::{MapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Vector,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub name: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(name: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            name: name.into(),
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
        }
    }
}

/// A feature together with the styles computed for it in one frame.
#[derive(Debug, Clone)]
pub struct RenderedFeature {
    pub layer_id: u64,
    pub feature: FeatureRef,
    pub styles: Vec<Style>,
}

pub trait Layer: AsAny {
    fn properties(&self) -> &LayerProperties;

    fn properties_mut(&mut self) -> &mut LayerProperties;

    fn name(&self) -> &str {
        &self.properties().name
    }

    fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    fn is_visible(&self) -> bool {
        self.properties().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.properties_mut().z_index = z_index;
    }

    fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    /// Features the layer displays at `resolution`.
    fn features(&self, _resolution: f64) -> Vec<FeatureRef> {
        Vec::new()
    }

    /// Evaluates styles for every displayed feature.
    fn render(&self, _layer_id: u64, _resolution: f64) -> Vec<RenderedFeature> {
        Vec::new()
    }
}

/// The layers of a map, kept in render order (z-index, then insertion).
pub struct LayerCollection {
    layers: HashMap<u64, Handle<dyn Layer>>,
    render_order: Vec<u64>,
}

impl LayerCollection {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    pub fn add(&mut self, layer: Handle<dyn Layer>) -> Result<()> {
        let layer_id = layer.id();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!(
                "layer {layer_id} is already on the map"
            )));
        }
        let z_index = layer.borrow().z_index();

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.borrow().z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.layers.insert(layer_id, layer);
        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    pub fn remove(&mut self, layer_id: u64) -> Option<Handle<dyn Layer>> {
        self.render_order.retain(|id| *id != layer_id);
        self.layers.remove(&layer_id)
    }

    pub fn get(&self, layer_id: u64) -> Option<&Handle<dyn Layer>> {
        self.layers.get(&layer_id)
    }

    pub fn contains(&self, layer_id: u64) -> bool {
        self.layers.contains_key(&layer_id)
    }

    /// Layer at `index` in render order.
    pub fn item(&self, index: usize) -> Option<&Handle<dyn Layer>> {
        self.render_order.get(index).and_then(|id| self.layers.get(id))
    }

    /// All layers in render order
    pub fn layers(&self) -> Vec<Handle<dyn Layer>> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerCollection {
    fn default() -> Self {
        Self::new()
    }
}
