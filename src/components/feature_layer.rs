use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::components::context::MapContext;
use crate::components::deps::{EffectDeps, PropRef};
use crate::components::style_map::{
    parse_style_map, resolve_feature_style, style_keys, StyleConfig, StyleMap,
};
use crate::components::Component;
use crate::core::config::ClusterConfig;
use crate::core::constants::{DEFAULT_DATA_PROJECTION, DEFAULT_FEATURE_TYPE};
use crate::core::geo::{transform, Projection};
use crate::data::records::FeatureRecord;
use crate::engine::cluster::ClusterSource;
use crate::engine::feature::{Feature, FeatureRef, Geometry, Payload};
use crate::engine::layer::Layer;
use crate::engine::style::StyleFunction;
use crate::engine::vector::{LayerSource, VectorLayer, VectorSource};
use crate::engine::{Handle, MapHandle};
use crate::traits::Configurable;
use crate::Result;

#[derive(Debug, Clone)]
pub struct FeatureLayerProps {
    pub features: Option<PropRef<Vec<FeatureRecord>>>,
    pub style_map: PropRef<StyleConfig>,
    pub layer_name: String,
    /// Projection of the record coordinates.
    pub projection: String,
    pub cluster: Option<ClusterConfig>,
    pub feature_type: String,
    /// Fit the view to the features after every rebuild.
    pub fit: bool,
    pub hidden: bool,
}

impl Default for FeatureLayerProps {
    fn default() -> Self {
        Self {
            features: None,
            style_map: PropRef::default(),
            layer_name: String::new(),
            projection: DEFAULT_DATA_PROJECTION.to_string(),
            cluster: None,
            feature_type: DEFAULT_FEATURE_TYPE.to_string(),
            fit: false,
            hidden: false,
        }
    }
}

impl FeatureLayerProps {
    pub fn new(layer_name: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            ..Default::default()
        }
    }

    pub fn with_features(mut self, features: PropRef<Vec<FeatureRecord>>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_style_map(mut self, style_map: PropRef<StyleConfig>) -> Self {
        self.style_map = style_map;
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_feature_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = feature_type.into();
        self
    }

    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

struct Attached {
    map: MapHandle,
    layer: Handle<VectorLayer>,
    source: Handle<VectorSource>,
}

/// Point features from records, optionally clustered, styled by `type`.
pub struct FeatureLayer {
    props: FeatureLayerProps,
    styles: Rc<RefCell<StyleMap>>,
    style_builds: u32,
    attached: Option<Attached>,
    style_deps: EffectDeps<PropRef<StyleConfig>>,
    map_deps: EffectDeps<Option<u64>>,
    resolver_deps: EffectDeps<Vec<String>>,
    feature_deps: EffectDeps<Option<PropRef<Vec<FeatureRecord>>>>,
    visibility_deps: EffectDeps<bool>,
}

impl FeatureLayer {
    pub fn new(props: FeatureLayerProps) -> Self {
        Self {
            props,
            styles: Rc::new(RefCell::new(StyleMap::new())),
            style_builds: 0,
            attached: None,
            style_deps: EffectDeps::new(),
            map_deps: EffectDeps::new(),
            resolver_deps: EffectDeps::new(),
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

    pub fn styles(&self) -> Ref<'_, StyleMap> {
        self.styles.borrow()
    }

    /// How many times the style table has been rebuilt.
    pub fn style_builds(&self) -> u32 {
        self.style_builds
    }

    fn attach(&mut self, map: MapHandle) -> Result<()> {
        log::debug!("creating source for feature layer '{}'", self.props.layer_name);
        let source = Handle::new(VectorSource::new());
        let layer_source = match &self.props.cluster {
            Some(config) => LayerSource::Cluster(ClusterSource::new(source.clone(), config)),
            None => LayerSource::Vector(source.clone()),
        };
        let layer = Handle::new(VectorLayer::new(
            self.props.layer_name.clone(),
            layer_source,
        ));
        map.borrow_mut().add_layer(layer.as_layer())?;

        self.attached = Some(Attached { map, layer, source });
        self.resolver_deps.reset();
        self.feature_deps.reset();
        self.visibility_deps.reset();
        Ok(())
    }

    fn detach(&mut self, clear: bool) {
        if let Some(attached) = self.attached.take() {
            log::debug!(
                "removing feature layer '{}' from map {}",
                self.props.layer_name,
                attached.map.id()
            );
            if clear {
                attached.source.clear();
            }
            attached.map.borrow_mut().remove_layer(attached.layer.id());
        }
    }

    fn install_resolver(&self, layer: &Handle<VectorLayer>) {
        let styles = Rc::clone(&self.styles);
        let resolver: StyleFunction = Rc::new(move |feature: &Feature, _resolution: f64| {
            vec![resolve_feature_style(feature, &styles.borrow())]
        });
        layer.borrow_mut().set_style(Some(resolver));
    }

    fn build_features(&self, attached: &Attached) -> Result<()> {
        if attached.source.borrow().revision() > 0 {
            attached.source.clear();
        }
        let Some(records) = &self.props.features else {
            return Ok(());
        };
        log::debug!(
            "building {} features for layer '{}'",
            records.len(),
            self.props.layer_name
        );

        let data_projection: Projection = self.props.projection.parse()?;
        let view_projection = attached.map.borrow().view().projection();
        let features: Vec<FeatureRef> = records
            .iter()
            .map(|record| {
                let at = transform(record.lon_lat(), data_projection, view_projection);
                Feature::new(Geometry::Point(at))
                    .with_feature_type(self.props.feature_type.clone())
                    .with_type_key(record.type_key())
                    .with_payload(Payload::Record(record.clone()))
                    .into_ref()
            })
            .collect();
        attached.source.add_features(features);

        if self.props.fit {
            let extent = attached.source.borrow().extent();
            if let Some(extent) = extent {
                attached.map.borrow_mut().fit(&extent);
            }
        }
        Ok(())
    }
}

impl Component for FeatureLayer {
    fn name(&self) -> &str {
        &self.props.layer_name
    }

    fn render(&mut self, ctx: &MapContext) -> Result<()> {
        if self.style_deps.changed(self.props.style_map.clone()) {
            *self.styles.borrow_mut() = parse_style_map(&self.props.style_map);
            self.style_builds += 1;
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

        let keys = style_keys(&self.styles.borrow());
        if self.resolver_deps.changed(keys) {
            self.install_resolver(&attached.layer);
        }

        if self.feature_deps.changed(self.props.features.clone()) {
            self.build_features(attached)?;
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

impl Configurable for FeatureLayer {
    type Config = FeatureLayerProps;

    fn config(&self) -> &FeatureLayerProps {
        &self.props
    }

    fn set_config(&mut self, config: FeatureLayerProps) -> Result<()> {
        Self::validate_config(&config)?;
        self.props = config;
        Ok(())
    }

    fn validate_config(config: &FeatureLayerProps) -> Result<()> {
        config.projection.parse::<Projection>().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::map_view::MapView;
    use crate::core::geo::{from_lon_lat, Coordinate};
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> PropRef<Vec<FeatureRecord>> {
        PropRef::new(values.into_iter().map(FeatureRecord::new).collect())
    }

    fn ready_context() -> MapContext {
        let ctx = MapContext::new();
        MapView::default().render(&ctx).unwrap();
        ctx
    }

    #[test]
    fn test_waits_for_map() {
        let ctx = MapContext::new();
        let mut layer = FeatureLayer::new(FeatureLayerProps::new("points"));
        layer.render(&ctx).unwrap();
        assert!(layer.layer().is_none());
        assert_eq!(layer.style_builds(), 1);
    }

    #[test]
    fn test_features_are_projected_points() {
        let ctx = ready_context();
        let props = FeatureLayerProps::new("points").with_features(records(vec![
            json!({"type": "Foo", "geometry": {"coordinates": [3.0, 4.0]}}),
        ]));
        let mut layer = FeatureLayer::new(props);
        layer.render(&ctx).unwrap();

        let source = layer.source().unwrap().borrow();
        let feature = &source.features()[0];
        assert_eq!(
            feature.geometry(),
            Some(&Geometry::Point(from_lon_lat(Coordinate::new(3.0, 4.0))))
        );
        assert_eq!(feature.feature_type(), Some("point"));
        assert_eq!(feature.type_key(), Some("Foo"));
    }

    #[test]
    fn test_same_reference_does_not_rebuild() {
        let ctx = ready_context();
        let features = records(vec![json!({"location": {"lat": 1.0, "long": 2.0}})]);
        let mut layer = FeatureLayer::new(FeatureLayerProps::new("points").with_features(features.clone()));
        layer.render(&ctx).unwrap();
        let revision = layer.source().unwrap().borrow().revision();

        layer.render(&ctx).unwrap();
        assert_eq!(layer.source().unwrap().borrow().revision(), revision);

        let equal = PropRef::new((*features).clone());
        layer.update_config(|p| p.features = Some(equal)).unwrap();
        layer.render(&ctx).unwrap();
        let source = layer.source().unwrap().borrow();
        // clear plus one add
        assert_eq!(source.revision(), revision + 2);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_hidden_toggles_visibility_only() {
        let ctx = ready_context();
        let mut layer = FeatureLayer::new(FeatureLayerProps::new("points"));
        layer.render(&ctx).unwrap();
        let id = layer.layer().unwrap().id();

        layer.update_config(|p| p.hidden = true).unwrap();
        layer.render(&ctx).unwrap();
        let handle = layer.layer().unwrap();
        assert_eq!(handle.id(), id);
        assert!(!handle.borrow().is_visible());
        assert_eq!(layer.style_builds(), 1);
    }

    #[test]
    fn test_style_rebuilds_on_new_reference_only() {
        let ctx = ready_context();
        let styles: StyleConfig =
            serde_json::from_value(json!({"Foo": {"stroke": {"color": "red"}}})).unwrap();
        let styles = PropRef::new(styles);
        let mut layer =
            FeatureLayer::new(FeatureLayerProps::new("points").with_style_map(styles.clone()));
        layer.render(&ctx).unwrap();
        layer.update_config(|p| p.style_map = styles.clone()).unwrap();
        layer.render(&ctx).unwrap();
        assert_eq!(layer.style_builds(), 1);

        layer
            .update_config(|p| p.style_map = PropRef::new((*styles).clone()))
            .unwrap();
        layer.render(&ctx).unwrap();
        assert_eq!(layer.style_builds(), 2);
        assert!(layer.styles().contains_key("Foo"));
    }

    #[test]
    fn test_cluster_source_is_used() {
        let ctx = ready_context();
        let mut layer = FeatureLayer::new(
            FeatureLayerProps::new("clustered")
                .with_cluster(ClusterConfig::default())
                .with_features(records(vec![json!([0.0, 0.0]), json!([0.0, 0.0])])),
        );
        layer.render(&ctx).unwrap();
        let handle = layer.layer().unwrap().borrow();
        assert!(matches!(handle.source(), LayerSource::Cluster(_)));
        let clusters = handle.features(1.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].features().len(), 2);
    }

    #[test]
    fn test_unmount_clears_and_removes() {
        let ctx = ready_context();
        let mut layer = FeatureLayer::new(
            FeatureLayerProps::new("points").with_features(records(vec![json!([1.0, 1.0])])),
        );
        layer.render(&ctx).unwrap();
        let source = layer.source().unwrap().clone();
        layer.unmount(&ctx).unwrap();

        assert!(source.borrow().is_empty());
        assert_eq!(ctx.map().unwrap().borrow().layers().len(), 1);
        assert!(layer.layer().is_none());
    }
}
