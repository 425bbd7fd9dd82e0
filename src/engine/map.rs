use std::rc::Rc;

use crate::core::bounds::Extent;
use crate::core::constants::{DEFAULT_MAP_SIZE, HIT_TOLERANCE_PX};
use crate::core::geo::Coordinate;
use crate::engine::control::{Control, ControlKind};
use crate::engine::dom::DomNode;
use crate::engine::feature::FeatureRef;
use crate::engine::interaction::Interaction;
use crate::engine::layer::{Layer, LayerCollection, RenderedFeature};
use crate::engine::overlay::Overlay;
use crate::engine::view::View;
use crate::engine::{Handle, ListenerKey, Listeners, MapHandle};
use crate::prelude::HashMap;
use crate::Result;

/// Browser-side events a map reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserEventKind {
    Click,
    SingleClick,
    DoubleClick,
    PointerMove,
    MoveEnd,
    ContextMenu,
    /// End of a box drag; the event carries the box extent.
    BoxEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapBrowserEvent {
    pub kind: BrowserEventKind,
    /// Map coordinate in the view projection.
    pub coordinate: Coordinate,
    pub pixel: Option<(f64, f64)>,
    pub extent: Option<Extent>,
}

impl MapBrowserEvent {
    pub fn new(kind: BrowserEventKind, coordinate: Coordinate) -> Self {
        Self {
            kind,
            coordinate,
            pixel: None,
            extent: None,
        }
    }

    pub fn with_pixel(mut self, pixel: (f64, f64)) -> Self {
        self.pixel = Some(pixel);
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }
}

/// Structural changes recorded by a map, drained with [`Map::process_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    LayerAdded { layer_id: u64 },
    LayerRemoved { layer_id: u64 },
    OverlayAdded { overlay_id: u64 },
    OverlayRemoved { overlay_id: u64 },
    InteractionAdded { interaction_id: u64 },
    InteractionRemoved { interaction_id: u64 },
    ControlAdded { kind: ControlKind },
    ViewChanged { center: Coordinate, zoom: f64 },
    TargetChanged { attached: bool },
}

pub struct Map {
    target: Option<DomNode>,
    view: View,
    layers: LayerCollection,
    overlays: Vec<Handle<Overlay>>,
    interactions: Vec<Handle<dyn Interaction>>,
    controls: Vec<Control>,
    size: (f64, f64),
    listeners: HashMap<BrowserEventKind, Listeners<MapBrowserEvent>>,
    journal: Vec<MapEvent>,
}

impl Map {
    pub fn new(view: View) -> Self {
        Self {
            target: None,
            view,
            layers: LayerCollection::new(),
            overlays: Vec::new(),
            interactions: Vec::new(),
            controls: Vec::new(),
            size: DEFAULT_MAP_SIZE,
            listeners: HashMap::default(),
            journal: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: DomNode) -> Self {
        self.set_target(Some(target));
        self
    }

    /// Attaches the map to `target`, or detaches it with `None`.
    pub fn set_target(&mut self, target: Option<DomNode>) {
        if let Some(old) = self.target.take() {
            old.detach();
        }
        if let Some(node) = &target {
            node.attach();
        }
        self.journal.push(MapEvent::TargetChanged {
            attached: target.is_some(),
        });
        self.target = target;
    }

    pub fn target(&self) -> Option<&DomNode> {
        self.target.as_ref()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.record_view_change();
    }

    /// Recenters the view without reporting a move.
    pub fn center_on(&mut self, center: Coordinate, zoom: Option<f64>) {
        self.view.set_center(center);
        if let Some(zoom) = zoom {
            self.view.set_zoom(zoom);
        }
        self.record_view_change();
    }

    /// Fits the view to `extent` in the current viewport size.
    pub fn fit(&mut self, extent: &Extent) {
        let size = self.size;
        self.view.fit(extent, size);
        self.record_view_change();
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn set_size(&mut self, size: (f64, f64)) {
        self.size = size;
    }

    fn record_view_change(&mut self) {
        self.journal.push(MapEvent::ViewChanged {
            center: self.view.center(),
            zoom: self.view.zoom(),
        });
    }

    pub fn add_layer(&mut self, layer: Handle<dyn Layer>) -> Result<()> {
        let layer_id = layer.id();
        self.layers.add(layer)?;
        log::debug!("layer {} added to map", layer_id);
        self.journal.push(MapEvent::LayerAdded { layer_id });
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: u64) -> Option<Handle<dyn Layer>> {
        let removed = self.layers.remove(layer_id);
        if removed.is_some() {
            self.journal.push(MapEvent::LayerRemoved { layer_id });
        }
        removed
    }

    pub fn layers(&self) -> &LayerCollection {
        &self.layers
    }

    pub fn add_overlay(&mut self, overlay: Handle<Overlay>) {
        if self.overlays.contains(&overlay) {
            return;
        }
        self.journal.push(MapEvent::OverlayAdded {
            overlay_id: overlay.id(),
        });
        self.overlays.push(overlay);
    }

    pub fn remove_overlay(&mut self, overlay_id: u64) -> Option<Handle<Overlay>> {
        let index = self.overlays.iter().position(|o| o.id() == overlay_id)?;
        self.journal.push(MapEvent::OverlayRemoved { overlay_id });
        Some(self.overlays.remove(index))
    }

    pub fn overlays(&self) -> &[Handle<Overlay>] {
        &self.overlays
    }

    pub fn add_interaction(&mut self, interaction: Handle<dyn Interaction>) {
        if self.interactions.contains(&interaction) {
            return;
        }
        self.journal.push(MapEvent::InteractionAdded {
            interaction_id: interaction.id(),
        });
        self.interactions.push(interaction);
    }

    pub fn remove_interaction(&mut self, interaction_id: u64) -> Option<Handle<dyn Interaction>> {
        let index = self
            .interactions
            .iter()
            .position(|i| i.id() == interaction_id)?;
        self.journal.push(MapEvent::InteractionRemoved { interaction_id });
        Some(self.interactions.remove(index))
    }

    pub fn interactions(&self) -> &[Handle<dyn Interaction>] {
        &self.interactions
    }

    pub fn add_control(&mut self, control: Control) {
        self.journal.push(MapEvent::ControlAdded {
            kind: control.kind(),
        });
        self.controls.push(control);
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn has_control(&self, kind: ControlKind) -> bool {
        self.controls.iter().any(|c| c.kind() == kind)
    }

    pub fn on<F>(&mut self, kind: BrowserEventKind, callback: F) -> ListenerKey
    where
        F: Fn(&MapBrowserEvent) + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .add(Rc::new(callback))
    }

    pub fn un(&mut self, key: ListenerKey) -> bool {
        self.listeners.values_mut().any(|l| l.remove(key))
    }

    pub fn listener_count(&self, kind: BrowserEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Listeners::len)
    }

    pub fn process_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.journal)
    }

    /// Features of visible layers under `coordinate`, topmost layer first.
    pub fn features_at(&self, coordinate: &Coordinate, tolerance: f64) -> Vec<FeatureRef> {
        let resolution = self.view.resolution();
        let mut hits = Vec::new();
        for layer in self.layers.layers().iter().rev() {
            let layer = layer.borrow();
            if !layer.is_visible() {
                continue;
            }
            hits.extend(layer.features(resolution).into_iter().filter(|f| {
                f.geometry()
                    .map_or(false, |g| g.hit(coordinate, tolerance))
            }));
        }
        hits
    }

    /// Evaluates every visible layer's styles in render order.
    pub fn render_frame(&self) -> Vec<RenderedFeature> {
        let resolution = self.view.resolution();
        self.layers
            .layers()
            .iter()
            .flat_map(|layer| layer.borrow().render(layer.id(), resolution))
            .collect()
    }
}

impl Handle<Map> {
    /// Delivers a browser event: map listeners first, then active
    /// interactions, then the work those interactions deferred.
    pub fn dispatch(&self, event: &MapBrowserEvent) {
        let callbacks = self
            .borrow()
            .listeners
            .get(&event.kind)
            .map(Listeners::snapshot)
            .unwrap_or_default();
        for callback in callbacks {
            callback(event);
        }

        let (interactions, hits) = {
            let map = self.borrow();
            let tolerance = map.view.resolution() * HIT_TOLERANCE_PX;
            (
                map.interactions.clone(),
                map.features_at(&event.coordinate, tolerance),
            )
        };

        let mut deferred = Vec::new();
        for interaction in &interactions {
            let mut interaction = interaction.borrow_mut();
            if interaction.is_active() {
                deferred.extend(interaction.handle_event(event, &hits));
            }
        }
        for work in deferred {
            work(self);
        }
    }

    /// Moves the view and reports the end of the move to `moveend` listeners.
    pub fn move_to(&self, center: Coordinate, zoom: Option<f64>) {
        self.borrow_mut().center_on(center, zoom);
        self.dispatch(&MapBrowserEvent::new(BrowserEventKind::MoveEnd, center));
    }

    /// Dispatches a pointer event at the position of `feature`'s geometry.
    pub fn click_feature(&self, kind: BrowserEventKind, feature: &FeatureRef) {
        if let Some(geometry) = feature.geometry() {
            self.dispatch(&MapBrowserEvent::new(kind, geometry.anchor()));
        }
    }
}

/// Creates a map handle around `view`.
pub fn new_map(view: View) -> MapHandle {
    Handle::new(Map::new(view))
}
