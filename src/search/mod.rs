//! Faceted search map
//!
//! [`SearchMapView`] is self-contained: it owns its map instead of sharing
//! one through a [`MapContext`](crate::MapContext). Each geo facet of the
//! search result gets its own vector layer; drawings, viewport moves and
//! right clicks are reported back through the callbacks in
//! [`SearchMapProps`].

pub mod bounds;
pub mod facets;
pub mod markers;
pub mod popup;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

use crate::components::deps::{EffectDeps, PropRef};
use crate::core::constants::{
    DEFAULT_CENTER_LON_LAT, DEFAULT_CSS_CLASS, DEFAULT_TILE_SERVER, DEFAULT_ZOOM,
    HIT_TOLERANCE_PX, MOUSE_POSITION_DECIMALS, SEARCH_MAP_HEIGHT, SEARCH_MAP_WIDTH,
    SEARCH_POPUP_PAN_MS, SEARCH_SINGLE_FEATURE_ZOOM,
};
use crate::core::geo::{transform, Coordinate, Projection};
use crate::data::conversion::{convert_geo_facets_to_geojson, get_geo_facets};
use crate::engine::control::{default_controls, Control, CoordinateFormat, MousePosition};
use crate::engine::dom::DomNode;
use crate::engine::feature::FeatureRef;
use crate::engine::interaction::{DragZoom, Draw, DrawMode, Interaction};
use crate::engine::layer::Layer;
use crate::engine::map::{new_map, BrowserEventKind, MapBrowserEvent};
use crate::engine::overlay::{AutoPan, Overlay};
use crate::engine::tile::{map_projection_for_server, tile_source_for_server, TileLayer};
use crate::engine::vector::{LayerSource, VectorLayer, VectorSource};
use crate::engine::view::View;
use crate::engine::{Handle, ListenerKey, MapHandle};
use crate::traits::Configurable;
use crate::{MapError, Result};

use self::bounds::{BoxBounds, DrawingBounds};
use self::facets::{Facets, GeoFacet};
use self::markers::feature_marker_style;
use self::popup::popup_html;

pub type DrawingCallback = Rc<dyn Fn(&DrawingBounds)>;
pub type BoundsCallback = Rc<dyn Fn(&BoxBounds)>;
pub type ResetCallback = Rc<dyn Fn()>;

/// What a pointer gesture on the search map does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTool {
    /// Drag a box to zoom into it.
    FreeHand,
    Point,
    Polygon,
    Circle,
}

impl DrawTool {
    pub fn label(&self) -> &'static str {
        match self {
            DrawTool::FreeHand => "Free Hand",
            DrawTool::Point => "Point",
            DrawTool::Polygon => "Polygon",
            DrawTool::Circle => "Circle",
        }
    }
}

impl FromStr for DrawTool {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Free Hand" => Ok(DrawTool::FreeHand),
            "Point" => Ok(DrawTool::Point),
            "Polygon" => Ok(DrawTool::Polygon),
            "Circle" => Ok(DrawTool::Circle),
            other => Err(MapError::ParseError(format!("unknown draw tool '{other}'"))),
        }
    }
}

#[derive(Clone)]
pub struct SearchMapProps {
    pub facets: Option<PropRef<Facets>>,
    /// Keys of the facets shown on the map, in legend order.
    pub geo_facet_names: Vec<String>,
    /// Projection of the facet data.
    pub projection: Projection,
    /// Initial centre in the data projection.
    pub lon_lat: Option<Coordinate>,
    pub zoom: Option<f64>,
    pub width: String,
    pub height: String,
    pub css_class: String,
    pub drawing_added: Option<DrawingCallback>,
    pub bounds_changed: Option<BoundsCallback>,
    pub reset_map: Option<ResetCallback>,
}

impl Default for SearchMapProps {
    fn default() -> Self {
        Self {
            facets: None,
            geo_facet_names: Vec::new(),
            projection: Projection::Epsg4326,
            lon_lat: None,
            zoom: None,
            width: SEARCH_MAP_WIDTH.to_string(),
            height: SEARCH_MAP_HEIGHT.to_string(),
            css_class: DEFAULT_CSS_CLASS.to_string(),
            drawing_added: None,
            bounds_changed: None,
            reset_map: None,
        }
    }
}

impl SearchMapProps {
    pub fn with_facets(mut self, facets: PropRef<Facets>) -> Self {
        self.facets = Some(facets);
        self
    }

    pub fn with_geo_facet_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geo_facet_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_lon_lat(mut self, lon_lat: impl Into<Coordinate>) -> Self {
        self.lon_lat = Some(lon_lat.into());
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = width.into();
        self.height = height.into();
        self
    }

    pub fn with_css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    pub fn on_drawing_added<F: Fn(&DrawingBounds) + 'static>(mut self, callback: F) -> Self {
        self.drawing_added = Some(Rc::new(callback));
        self
    }

    pub fn on_bounds_changed<F: Fn(&BoxBounds) + 'static>(mut self, callback: F) -> Self {
        self.bounds_changed = Some(Rc::new(callback));
        self
    }

    pub fn on_reset_map<F: Fn() + 'static>(mut self, callback: F) -> Self {
        self.reset_map = Some(Rc::new(callback));
        self
    }

    /// Centre the map returns to on reset, in `map_projection`.
    fn home(&self, map_projection: Projection) -> Coordinate {
        match self.lon_lat {
            Some(lon_lat) => transform(lon_lat, self.projection, map_projection),
            None => transform(
                Coordinate::from(DEFAULT_CENTER_LON_LAT),
                Projection::Epsg4326,
                map_projection,
            ),
        }
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    /// Index of the facet layer, as accepted by
    /// [`SearchMapView::toggle_layer_visible`].
    pub index: usize,
    pub label: String,
    pub color: String,
    pub visible: bool,
}

/// State reached from the map and source listeners.
struct Session {
    map: MapHandle,
    props: SearchMapProps,
    map_projection: Projection,
    overlay: Handle<Overlay>,
    popup_content: DomNode,
    drawings: Handle<VectorSource>,
    interaction: Option<Handle<dyn Interaction>>,
    initial_move: bool,
}

impl Session {
    fn remove_interaction(&mut self) {
        if let Some(interaction) = self.interaction.take() {
            self.map.borrow_mut().remove_interaction(interaction.id());
        }
    }
}

fn handle_drawing(session: &RefCell<Session>, in_flight: &Cell<bool>, feature: &FeatureRef) {
    if in_flight.replace(true) {
        log::debug!("dropping drawing added while another one is being reported");
        return;
    }
    let (callback, bounds) = {
        let session = session.borrow();
        let bounds = feature.geometry().and_then(|g| {
            DrawingBounds::from_geometry(g, session.map_projection, session.props.projection)
        });
        (session.props.drawing_added.clone(), bounds)
    };
    if let (Some(callback), Some(bounds)) = (callback, bounds) {
        callback(&bounds);
    }
    in_flight.set(false);
}

fn handle_map_click(session: &RefCell<Session>, event: &MapBrowserEvent) {
    let session = session.borrow();
    session.overlay.borrow_mut().set_position(None);

    let features = {
        let map = session.map.borrow();
        let tolerance = map.view().resolution() * HIT_TOLERANCE_PX;
        map.features_at(&event.coordinate, tolerance)
    };
    let html = popup_html(&features);
    if !html.is_empty() {
        session.popup_content.set_content(html);
        session
            .overlay
            .borrow_mut()
            .set_position(Some(event.coordinate));
    }
}

fn handle_map_move(session: &RefCell<Session>) {
    let (callback, bounds) = {
        let mut session = session.borrow_mut();
        let bounds = {
            let map = session.map.borrow();
            let extent = map.view().calculate_extent(map.size());
            BoxBounds::from_extent(&extent, session.map_projection, session.props.projection)
        };
        if session.initial_move {
            session.initial_move = false;
            return;
        }
        (session.props.bounds_changed.clone(), bounds)
    };
    if let Some(callback) = callback {
        callback(&bounds);
    }
}

fn reset_map(session: &RefCell<Session>) {
    let callback = {
        let mut session = session.borrow_mut();
        log::debug!("resetting search map {}", session.map.id());
        session.drawings.clear();
        let home = session.props.home(session.map_projection);
        let zoom = session.props.zoom.unwrap_or(DEFAULT_ZOOM);
        session.map.borrow_mut().center_on(home, Some(zoom));
        session.remove_interaction();
        session.props.reset_map.clone()
    };
    if let Some(callback) = callback {
        callback();
    }
}

/// A faceted search result on its own map.
pub struct SearchMapView {
    props: SearchMapProps,
    anchor: DomNode,
    popup: DomNode,
    popup_content: DomNode,
    session: Option<Rc<RefCell<Session>>>,
    base_layer: Option<Handle<TileLayer>>,
    layers: Vec<Handle<VectorLayer>>,
    show_layers: Vec<bool>,
    geo_facets: Vec<GeoFacet>,
    drawings_layer: Option<Handle<VectorLayer>>,
    map_listeners: Vec<ListenerKey>,
    drawing_listener: Option<ListenerKey>,
    in_flight: Rc<Cell<bool>>,
    facets_deps: EffectDeps<Option<PropRef<Facets>>>,
    tile_server: String,
    draw_tool: Option<DrawTool>,
    show_map: bool,
    mounted: bool,
}

impl SearchMapView {
    pub fn new(props: SearchMapProps) -> Self {
        let anchor = DomNode::new(props.css_class.clone());
        Self {
            props,
            anchor,
            popup: DomNode::new("ol-popup"),
            popup_content: DomNode::new("popup-content"),
            session: None,
            base_layer: None,
            layers: Vec::new(),
            show_layers: Vec::new(),
            geo_facets: Vec::new(),
            drawings_layer: None,
            map_listeners: Vec::new(),
            drawing_listener: None,
            in_flight: Rc::new(Cell::new(false)),
            facets_deps: EffectDeps::new(),
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            draw_tool: Some(DrawTool::FreeHand),
            show_map: true,
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn map(&self) -> Option<MapHandle> {
        self.session.as_ref().map(|s| s.borrow().map.clone())
    }

    pub fn anchor(&self) -> &DomNode {
        &self.anchor
    }

    pub fn popup_content(&self) -> &DomNode {
        &self.popup_content
    }

    pub fn overlay(&self) -> Option<Handle<Overlay>> {
        self.session.as_ref().map(|s| s.borrow().overlay.clone())
    }

    pub fn base_layer(&self) -> Option<&Handle<TileLayer>> {
        self.base_layer.as_ref()
    }

    /// Facet layers, in geo facet order.
    pub fn layers(&self) -> &[Handle<VectorLayer>] {
        &self.layers
    }

    pub fn drawings(&self) -> Option<Handle<VectorSource>> {
        self.session.as_ref().map(|s| s.borrow().drawings.clone())
    }

    pub fn geo_facets(&self) -> &[GeoFacet] {
        &self.geo_facets
    }

    pub fn interaction(&self) -> Option<Handle<dyn Interaction>> {
        self.session
            .as_ref()
            .and_then(|s| s.borrow().interaction.clone())
    }

    pub fn tile_server(&self) -> &str {
        &self.tile_server
    }

    pub fn map_projection(&self) -> Projection {
        map_projection_for_server(&self.tile_server)
    }

    pub fn show_map(&self) -> bool {
        self.show_map
    }

    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(MapError::Configuration(
                "search map is already mounted".to_string(),
            ));
        }
        self.anchor.attach();
        self.popup.attach();
        self.popup_content.attach();
        self.apply_map_style();
        self.mounted = true;
        if self.facets_deps.changed(self.props.facets.clone()) {
            self.process_data()?;
        }
        Ok(())
    }

    /// Replaces the props; the facet layers are rebuilt only when the
    /// `facets` reference changes.
    pub fn set_props(&mut self, props: SearchMapProps) -> Result<()> {
        self.props = props;
        if let Some(session) = &self.session {
            session.borrow_mut().props = self.props.clone();
        }
        if self.mounted && self.facets_deps.changed(self.props.facets.clone()) {
            self.process_data()?;
        }
        Ok(())
    }

    fn apply_map_style(&self) {
        if self.show_map {
            self.anchor.set_style("display", "block");
            self.anchor.set_style("width", self.props.width.clone());
            self.anchor.set_style("height", self.props.height.clone());
        } else {
            self.anchor.set_style("display", "none");
        }
        self.anchor.set_visible(self.show_map);
    }

    fn process_data(&mut self) -> Result<()> {
        let map_projection = self.map_projection();
        let data_projection = self.props.projection;
        self.geo_facets = match &self.props.facets {
            Some(facets) => get_geo_facets(facets, &self.props.geo_facet_names),
            None => Vec::new(),
        };
        let collections =
            convert_geo_facets_to_geojson(&self.geo_facets, data_projection, map_projection);
        log::debug!("processing {} geo facets", collections.len());

        let first_run = self.layers.is_empty();
        let mut center = None;
        let mut created = Vec::new();
        for (index, geojson) in collections.iter().enumerate() {
            let features = geojson.read_features(map_projection, map_projection);
            if let Some(layer) = self.layers.get(index) {
                let source = layer.borrow().vector_source();
                source.clear();
                source.add_features(features);
                continue;
            }
            let source = Handle::new(VectorSource::new());
            source.add_features(features);
            if source.borrow().len() == 1 {
                center = source.borrow().extent().map(|e| e.center());
            }
            let layer = Handle::new(
                VectorLayer::new(self.geo_facets[index].name.clone(), LayerSource::Vector(source))
                    .with_style(feature_marker_style()),
            );
            created.push(layer);
        }
        for stale in self.layers.iter().skip(collections.len()) {
            stale.borrow().vector_source().clear();
        }

        match self.map() {
            Some(map) => {
                if first_run {
                    if let Some(center) = center {
                        let zoom = self.props.zoom.unwrap_or(SEARCH_SINGLE_FEATURE_ZOOM);
                        map.borrow_mut().center_on(center, Some(zoom));
                    }
                }
                for layer in &created {
                    log::debug!("adding facet layer '{}'", layer.borrow().name());
                    map.borrow_mut().add_layer(layer.as_layer())?;
                }
                self.show_layers.extend(created.iter().map(|_| true));
                self.layers.extend(created);
            }
            None => {
                self.show_layers = created.iter().map(|_| true).collect();
                self.layers = created;
                self.create_map(center)?;
            }
        }
        Ok(())
    }

    fn create_map(&mut self, center: Option<Coordinate>) -> Result<()> {
        let map_projection = self.map_projection();
        let data_projection = self.props.projection;
        let center = center.unwrap_or_else(|| self.props.home(map_projection));
        let view = View::new(map_projection)
            .with_center(center)
            .with_zoom(self.props.zoom.unwrap_or(DEFAULT_ZOOM));

        let overlay = Handle::new(
            Overlay::new(self.popup.clone()).with_auto_pan(AutoPan::from(SEARCH_POPUP_PAN_MS)),
        );
        let drawings = Handle::new(VectorSource::new());
        let drawings_layer = Handle::new(VectorLayer::new(
            "drawings",
            LayerSource::Vector(drawings.clone()),
        ));
        let base = Handle::new(TileLayer::new(tile_source_for_server(&self.tile_server)));

        let map = new_map(view);
        {
            let mut m = map.borrow_mut();
            m.set_target(Some(self.anchor.clone()));
            m.add_layer(base.as_layer())?;
            for layer in &self.layers {
                m.add_layer(layer.as_layer())?;
            }
            m.add_layer(drawings_layer.as_layer())?;
            m.add_overlay(overlay.clone());
            for control in default_controls() {
                m.add_control(control);
            }
            m.add_control(Control::FullScreen);
            m.add_control(Control::MousePosition(MousePosition::new(
                CoordinateFormat::Template {
                    template: "lat: {y}, lng: {x}".to_string(),
                    decimals: MOUSE_POSITION_DECIMALS,
                },
                data_projection,
            )));
        }
        log::info!(
            "created search map {} in {} with {} facet layers",
            map.id(),
            map_projection,
            self.layers.len()
        );

        let session = Rc::new(RefCell::new(Session {
            map: map.clone(),
            props: self.props.clone(),
            map_projection,
            overlay,
            popup_content: self.popup_content.clone(),
            drawings: drawings.clone(),
            interaction: None,
            initial_move: true,
        }));
        self.session = Some(Rc::clone(&session));
        self.base_layer = Some(base);
        self.drawings_layer = Some(drawings_layer);

        self.select_draw_mode(self.draw_tool);
        self.bind_listeners(&session, &drawings);

        // the first render of the map reports a move of its own
        map.dispatch(&MapBrowserEvent::new(BrowserEventKind::MoveEnd, center));
        Ok(())
    }

    fn bind_listeners(&mut self, session: &Rc<RefCell<Session>>, drawings: &Handle<VectorSource>) {
        let on_drawing = Rc::clone(session);
        let in_flight = Rc::clone(&self.in_flight);
        self.drawing_listener = Some(
            drawings
                .borrow_mut()
                .on_add_feature(move |feature| handle_drawing(&on_drawing, &in_flight, feature)),
        );

        let map = session.borrow().map.clone();
        let mut m = map.borrow_mut();
        let on_click = Rc::clone(session);
        self.map_listeners.push(m.on(BrowserEventKind::SingleClick, move |event| {
            handle_map_click(&on_click, event)
        }));
        let on_move = Rc::clone(session);
        self.map_listeners
            .push(m.on(BrowserEventKind::MoveEnd, move |_| handle_map_move(&on_move)));
        let on_menu = Rc::clone(session);
        self.map_listeners
            .push(m.on(BrowserEventKind::ContextMenu, move |_| reset_map(&on_menu)));
    }

    /// Switches the base tiles. A server needing another view projection
    /// reprojects the view and rebuilds the facet features; drawings made
    /// in the old projection are discarded.
    pub fn select_tile_server(&mut self, key: &str) -> Result<()> {
        log::debug!("switching tile server to {key}");
        let previous = self.map_projection();
        self.tile_server = key.to_string();
        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        if let Some(base) = &self.base_layer {
            base.borrow_mut().set_source(tile_source_for_server(key));
        }

        let projection = self.map_projection();
        if projection == previous {
            return Ok(());
        }
        {
            let mut session = session.borrow_mut();
            session.map_projection = projection;
            session.drawings.clear();
            let mut map = session.map.borrow_mut();
            let old = map.view().clone();
            let view = View::new(projection)
                .with_zoom_limits(Some(old.min_zoom()), Some(old.max_zoom()))
                .with_center(transform(old.center(), previous, projection))
                .with_zoom(old.zoom());
            map.set_view(view);
        }
        self.process_data()
    }

    /// Replaces the pointer interaction; `None` leaves the map with none.
    pub fn select_draw_mode(&mut self, tool: Option<DrawTool>) {
        self.draw_tool = tool;
        let Some(session) = &self.session else {
            return;
        };
        let mut session = session.borrow_mut();
        session.remove_interaction();
        let interaction = match tool {
            None => return,
            Some(DrawTool::FreeHand) => Handle::new(DragZoom::new()).as_interaction(),
            Some(DrawTool::Point) => draw(DrawMode::Point, &session.drawings),
            Some(DrawTool::Polygon) => draw(DrawMode::Polygon, &session.drawings),
            Some(DrawTool::Circle) => draw(DrawMode::Circle, &session.drawings),
        };
        log::debug!("search map interaction is now {}", interaction.borrow().name());
        session.map.borrow_mut().add_interaction(interaction.clone());
        session.interaction = Some(interaction);
    }

    /// Flips the visibility of facet layer `index`, returning the new state.
    pub fn toggle_layer_visible(&mut self, index: usize) -> Option<bool> {
        let visible = self.show_layers.get_mut(index)?;
        *visible = !*visible;
        if let Some(layer) = self.layers.get(index) {
            layer.borrow_mut().set_visible(*visible);
        }
        Some(*visible)
    }

    pub fn toggle_show_map(&mut self) -> bool {
        self.show_map = !self.show_map;
        self.apply_map_style();
        self.show_map
    }

    pub fn close_popup(&self) {
        if let Some(overlay) = self.overlay() {
            overlay.borrow_mut().set_position(None);
        }
    }

    /// Legend rows for the geo facets that have entries.
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.geo_facets
            .iter()
            .enumerate()
            .filter(|(_, geo)| geo.facet.entry_count() > 0)
            .map(|(index, geo)| LegendEntry {
                index,
                label: geo.legend_label(),
                color: geo.color.clone(),
                visible: self.show_layers.get(index).copied().unwrap_or(true),
            })
            .collect()
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        if let Some(session) = self.session.take() {
            let mut session = session.borrow_mut();
            if let Some(key) = self.drawing_listener.take() {
                session.drawings.borrow_mut().un(key);
            }
            session.remove_interaction();
            let handle = session.map.clone();
            let mut map = handle.borrow_mut();
            for key in self.map_listeners.drain(..) {
                map.un(key);
            }
            map.remove_overlay(session.overlay.id());
            let layer_ids = self
                .base_layer
                .take()
                .map(|l| l.id())
                .into_iter()
                .chain(self.layers.iter().map(Handle::id))
                .chain(self.drawings_layer.take().map(|l| l.id()));
            for id in layer_ids {
                map.remove_layer(id);
            }
            map.set_target(None);
            log::debug!("unmounted search map {}", handle.id());
        }
        self.layers.clear();
        self.show_layers.clear();
        self.geo_facets.clear();
        self.facets_deps.reset();
        self.anchor.detach();
        self.popup.detach();
        self.popup_content.detach();
        self.mounted = false;
    }
}

fn draw(mode: DrawMode, drawings: &Handle<VectorSource>) -> Handle<dyn Interaction> {
    Handle::new(Draw::new(mode, drawings.clone())).as_interaction()
}

impl Default for SearchMapView {
    fn default() -> Self {
        Self::new(SearchMapProps::default())
    }
}

impl Drop for SearchMapView {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl Configurable for SearchMapView {
    type Config = SearchMapProps;

    fn config(&self) -> &SearchMapProps {
        &self.props
    }

    fn set_config(&mut self, config: SearchMapProps) -> Result<()> {
        self.set_props(config)
    }
}
