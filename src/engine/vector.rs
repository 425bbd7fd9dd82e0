use crate::core::bounds::Extent;
use crate::engine::cluster::ClusterSource;
use crate::engine::feature::FeatureRef;
use crate::engine::layer::{Layer, LayerProperties, LayerType, RenderedFeature};
use crate::engine::style::{Style, StyleFunction};
use crate::engine::{Handle, ListenerKey, Listeners};
use std::rc::Rc;

/// Mutable feature collection. Mutations go through the handle so that
/// `addfeature` listeners run after the source has been released.
pub struct VectorSource {
    features: Vec<FeatureRef>,
    revision: u64,
    add_listeners: Listeners<FeatureRef>,
}

impl VectorSource {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            revision: 0,
            add_listeners: Listeners::new(),
        }
    }

    pub fn features(&self) -> &[FeatureRef] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Incremented by every add and clear.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Extent of all feature geometries, `None` for an empty source.
    pub fn extent(&self) -> Option<Extent> {
        let mut extent = Extent::empty();
        for geometry in self.features.iter().filter_map(|f| f.geometry()) {
            extent.extend_extent(&geometry.extent());
        }
        (!extent.is_empty()).then_some(extent)
    }

    pub fn on_add_feature<F>(&mut self, callback: F) -> ListenerKey
    where
        F: Fn(&FeatureRef) + 'static,
    {
        self.add_listeners.add(Rc::new(callback))
    }

    pub fn un(&mut self, key: ListenerKey) -> bool {
        self.add_listeners.remove(key)
    }
}

impl Default for VectorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle<VectorSource> {
    pub fn add_feature(&self, feature: FeatureRef) {
        self.add_features(vec![feature]);
    }

    pub fn add_features(&self, features: Vec<FeatureRef>) {
        let callbacks = {
            let mut source = self.borrow_mut();
            source.features.extend(features.iter().cloned());
            source.revision += 1;
            source.add_listeners.snapshot()
        };
        for feature in &features {
            for callback in &callbacks {
                callback(feature);
            }
        }
    }

    pub fn clear(&self) {
        let mut source = self.borrow_mut();
        source.features.clear();
        source.revision += 1;
    }
}

/// Where a vector layer reads its features from.
pub enum LayerSource {
    Vector(Handle<VectorSource>),
    Cluster(ClusterSource),
}

impl LayerSource {
    /// The underlying feature source, unwrapping a cluster source.
    pub fn vector_source(&self) -> &Handle<VectorSource> {
        match self {
            LayerSource::Vector(source) => source,
            LayerSource::Cluster(cluster) => cluster.source(),
        }
    }
}

pub struct VectorLayer {
    properties: LayerProperties,
    source: LayerSource,
    style: Option<StyleFunction>,
}

impl VectorLayer {
    pub fn new(name: impl Into<String>, source: LayerSource) -> Self {
        Self {
            properties: LayerProperties::new(name, LayerType::Vector),
            source,
            style: None,
        }
    }

    pub fn with_style(mut self, style: StyleFunction) -> Self {
        self.style = Some(style);
        self
    }

    pub fn set_style(&mut self, style: Option<StyleFunction>) {
        self.style = style;
    }

    pub fn has_style(&self) -> bool {
        self.style.is_some()
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    pub fn vector_source(&self) -> Handle<VectorSource> {
        self.source.vector_source().clone()
    }
}

impl Layer for VectorLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn features(&self, resolution: f64) -> Vec<FeatureRef> {
        match &self.source {
            LayerSource::Vector(source) => source.borrow().features().to_vec(),
            LayerSource::Cluster(cluster) => cluster.features(resolution),
        }
    }

    fn render(&self, layer_id: u64, resolution: f64) -> Vec<RenderedFeature> {
        if !self.is_visible() {
            return Vec::new();
        }
        self.features(resolution)
            .into_iter()
            .map(|feature| {
                let styles = match &self.style {
                    Some(style) => style(&feature, resolution),
                    None => vec![Style::neutral()],
                };
                RenderedFeature {
                    layer_id,
                    feature,
                    styles,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Coordinate;
    use crate::engine::feature::{Feature, Geometry};
    use std::cell::RefCell;

    fn point(x: f64, y: f64) -> FeatureRef {
        Feature::new(Geometry::Point(Coordinate::new(x, y))).into_ref()
    }

    #[test]
    fn test_add_and_clear_bump_revision() {
        let source = Handle::new(VectorSource::new());
        source.add_features(vec![point(0.0, 0.0), point(2.0, 4.0)]);
        assert_eq!(source.borrow().len(), 2);
        assert_eq!(source.borrow().extent().unwrap().to_array(), [0.0, 0.0, 2.0, 4.0]);

        source.clear();
        assert!(source.borrow().is_empty());
        assert_eq!(source.borrow().revision(), 2);
        assert!(source.borrow().extent().is_none());
    }

    #[test]
    fn test_listener_may_mutate_source() {
        let source = Handle::new(VectorSource::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let inner = source.clone();
        let log = Rc::clone(&seen);
        source.borrow_mut().on_add_feature(move |f| {
            log.borrow_mut().push(f.id());
            // reading the source from inside the callback must not panic
            let _ = inner.borrow().len();
        });

        let f = point(1.0, 1.0);
        source.add_feature(f.clone());
        assert_eq!(*seen.borrow(), vec![f.id()]);
    }

    #[test]
    fn test_unstyled_layer_uses_neutral_style() {
        let source = Handle::new(VectorSource::new());
        source.add_feature(point(0.0, 0.0));
        let layer = VectorLayer::new("plain", LayerSource::Vector(source));
        let frame = layer.render(7, 1.0);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].styles, vec![Style::neutral()]);
    }
}
