use crate::components::context::MapContext;
use crate::components::Component;
use crate::core::config::{BaseLayerConfig, MapViewConfig};
use crate::core::constants::MOUSE_POSITION_DECIMALS;
use crate::core::geo::{transform, Coordinate, Projection};
use crate::engine::control::{default_controls, Control, CoordinateFormat, MousePosition};
use crate::engine::dom::DomNode;
use crate::engine::map::new_map;
use crate::engine::tile::{tile_source_for_server, TileLayer, TileSource};
use crate::engine::view::View;
use crate::engine::{Handle, MapHandle};
use crate::traits::Configurable;
use crate::{MapError, Result};

/// Builds the shared map once and publishes it to the context.
///
/// The configuration is read when the map is built and never again.
pub struct MapView {
    config: MapViewConfig,
    anchor: DomNode,
    owns_anchor: bool,
    map: Option<MapHandle>,
    base_layer: Option<Handle<TileLayer>>,
}

impl MapView {
    /// A view rendering into its own anchor node.
    pub fn new(config: MapViewConfig) -> Self {
        let anchor = DomNode::new(config.css_class.clone());
        Self {
            config,
            anchor,
            owns_anchor: true,
            map: None,
            base_layer: None,
        }
    }

    /// A view rendering into a node owned by the host, which must be
    /// attached before the first render.
    pub fn with_anchor(config: MapViewConfig, anchor: DomNode) -> Self {
        Self {
            config,
            anchor,
            owns_anchor: false,
            map: None,
            base_layer: None,
        }
    }

    pub fn anchor(&self) -> &DomNode {
        &self.anchor
    }

    pub fn map(&self) -> Option<&MapHandle> {
        self.map.as_ref()
    }

    pub fn base_layer(&self) -> Option<&Handle<TileLayer>> {
        self.base_layer.as_ref()
    }

    fn base_source(&self) -> TileSource {
        match self.config.base_layer() {
            BaseLayerConfig::Bing {
                api_key,
                imagery_set,
            } => TileSource::Bing {
                api_key,
                imagery_set,
            },
            BaseLayerConfig::Server(key) => tile_source_for_server(&key),
            BaseLayerConfig::Osm => TileSource::Osm,
        }
    }

    fn build(&mut self) -> Result<MapHandle> {
        self.config.validate()?;
        if self.owns_anchor {
            self.anchor.attach();
        }
        if !self.anchor.is_attached() {
            return Err(MapError::Configuration(format!(
                "map anchor '{}' is not attached",
                self.anchor.class()
            )));
        }

        let projection = self.config.projection()?;
        let center = transform(
            Coordinate::from(self.config.center),
            Projection::Epsg4326,
            projection,
        );
        let view = View::new(projection)
            .with_zoom_limits(self.config.min_zoom, self.config.max_zoom)
            .with_center(center)
            .with_zoom(self.config.zoom);

        let base = Handle::new(TileLayer::new(self.base_source()));
        let map = new_map(view);
        {
            let mut m = map.borrow_mut();
            m.set_target(Some(self.anchor.clone()));
            m.add_layer(base.as_layer())?;
            for control in default_controls() {
                m.add_control(control);
            }
            if self.config.allow_full_screen {
                m.add_control(Control::FullScreen);
            }
            if self.config.show_mouse_position {
                m.add_control(Control::MousePosition(MousePosition::new(
                    CoordinateFormat::StringXY {
                        decimals: MOUSE_POSITION_DECIMALS,
                    },
                    projection,
                )));
            }
        }
        log::info!(
            "created map {} in {} at zoom {}",
            map.id(),
            projection,
            self.config.zoom
        );
        self.base_layer = Some(base);
        Ok(map)
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(MapViewConfig::default())
    }
}

impl Component for MapView {
    fn name(&self) -> &str {
        "map-view"
    }

    fn render(&mut self, ctx: &MapContext) -> Result<()> {
        if self.map.is_none() {
            let map = self.build()?;
            self.map = Some(map.clone());
            ctx.set_map(map)?;
        }
        Ok(())
    }

    fn unmount(&mut self, _ctx: &MapContext) -> Result<()> {
        if let Some(map) = self.map.take() {
            log::debug!("detaching map {} from its target", map.id());
            map.borrow_mut().set_target(None);
        }
        self.base_layer = None;
        if self.owns_anchor {
            self.anchor.detach();
        }
        Ok(())
    }
}

impl Configurable for MapView {
    type Config = MapViewConfig;

    fn config(&self) -> &MapViewConfig {
        &self.config
    }

    /// Only accepted before the map is built.
    fn set_config(&mut self, config: MapViewConfig) -> Result<()> {
        if self.map.is_some() {
            log::warn!("ignoring configuration change on a mounted map view");
            return Err(MapError::Unsupported(
                "a map view cannot be reconfigured after its map is built".to_string(),
            ));
        }
        Self::validate_config(&config)?;
        self.config = config;
        Ok(())
    }

    fn validate_config(config: &MapViewConfig) -> Result<()> {
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::control::ControlKind;
    use crate::engine::layer::LayerType;
    use approx::assert_relative_eq;

    #[test]
    fn test_builds_and_publishes_once() {
        let ctx = MapContext::new();
        let mut view = MapView::default();
        view.render(&ctx).unwrap();
        view.render(&ctx).unwrap();
        assert_eq!(ctx.version(), 1);

        let map = ctx.map().unwrap();
        let map = map.borrow();
        assert_eq!(map.layers().len(), 1);
        assert_eq!(map.layers().layers()[0].borrow().layer_type(), LayerType::Tile);
        assert!(map.has_control(ControlKind::FullScreen));
        assert!(map.has_control(ControlKind::MousePosition));
        assert!(map.target().unwrap().is_attached());
        assert_eq!(map.view().zoom(), 4.0);
        assert_relative_eq!(map.view().center().x, -10663294.023, epsilon = 1e-2);
    }

    #[test]
    fn test_flags_disable_controls() {
        let config = MapViewConfig {
            allow_full_screen: false,
            show_mouse_position: false,
            ..Default::default()
        };
        let ctx = MapContext::new();
        let mut view = MapView::new(config);
        view.render(&ctx).unwrap();
        let map = ctx.map().unwrap();
        assert_eq!(map.borrow().controls().len(), 3);
    }

    #[test]
    fn test_detached_host_anchor_is_fatal() {
        let ctx = MapContext::new();
        let mut view = MapView::with_anchor(MapViewConfig::default(), DomNode::new("olmap"));
        assert!(matches!(view.render(&ctx), Err(MapError::Configuration(_))));
        assert!(!ctx.is_ready());
    }

    #[test]
    fn test_reconfiguration_after_mount_is_rejected() {
        let ctx = MapContext::new();
        let mut view = MapView::default();
        view.update_config(|c| c.zoom = 6.0).unwrap();
        view.render(&ctx).unwrap();

        let result = view.update_config(|c| c.zoom = 9.0);
        assert!(matches!(result, Err(MapError::Unsupported(_))));
        assert_eq!(view.config().zoom, 6.0);
        assert_eq!(ctx.map().unwrap().borrow().view().zoom(), 6.0);
    }

    #[test]
    fn test_bing_key_selects_bing_source() {
        let config = MapViewConfig::from_json_str(r#"{"bingAPIKey": "k"}"#).unwrap();
        let ctx = MapContext::new();
        let mut view = MapView::new(config);
        view.render(&ctx).unwrap();
        let base = view.base_layer().unwrap().borrow();
        assert_eq!(
            *base.source(),
            TileSource::Bing {
                api_key: "k".to_string(),
                imagery_set: "AerialWithLabels".to_string()
            }
        );
    }

    #[test]
    fn test_unmount_detaches_anchor() {
        let ctx = MapContext::new();
        let mut view = MapView::default();
        view.render(&ctx).unwrap();
        let map = ctx.map().unwrap();
        view.unmount(&ctx).unwrap();
        assert!(map.borrow().target().is_none());
        assert!(!view.anchor().is_attached());
    }
}
