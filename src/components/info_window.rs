use std::cell::RefCell;
use std::rc::Rc;

use crate::components::context::MapContext;
use crate::components::deps::EffectDeps;
use crate::components::Component;
use crate::core::constants::INFO_WINDOW_CLASS;
use crate::core::geo::{transform, Projection};
use crate::engine::dom::DomNode;
use crate::engine::feature::{Feature, FeatureRef, Payload};
use crate::engine::interaction::{Condition, FeatureFilter, Select, SelectEvent};
use crate::engine::overlay::{AutoPan, Overlay};
use crate::engine::{Handle, ListenerKey, MapHandle};
use crate::traits::Configurable;
use crate::Result;

/// Which pointer gesture opens the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionTrigger {
    Hover,
    Click,
    #[default]
    Default,
}

impl InteractionTrigger {
    pub fn condition(&self) -> Condition {
        match self {
            InteractionTrigger::Hover => Condition::PointerMove,
            InteractionTrigger::Click => Condition::Click,
            InteractionTrigger::Default => Condition::SingleClick,
        }
    }
}

impl From<&str> for InteractionTrigger {
    /// Unrecognised names select the default trigger.
    fn from(s: &str) -> Self {
        match s {
            "hover" => InteractionTrigger::Hover,
            "click" => InteractionTrigger::Click,
            _ => InteractionTrigger::Default,
        }
    }
}

/// What the renderer is given.
#[derive(Debug, Clone, Default)]
pub struct InfoContent {
    /// Payload of the current selection.
    pub feature: Option<Payload>,
    /// Members of a selected aggregate.
    pub features: Vec<FeatureRef>,
}

pub type Renderer = Rc<dyn Fn(&InfoContent) -> String>;

#[derive(Clone)]
pub struct InfoWindowProps {
    pub interaction: InteractionTrigger,
    pub auto_pan: AutoPan,
    /// Effective feature types that never open the window.
    pub ignore_types: Vec<String>,
    pub renderer: Renderer,
}

impl Default for InfoWindowProps {
    fn default() -> Self {
        Self {
            interaction: InteractionTrigger::Default,
            auto_pan: AutoPan::Disabled,
            ignore_types: Vec::new(),
            renderer: Rc::new(|_| String::new()),
        }
    }
}

impl InfoWindowProps {
    pub fn with_interaction(mut self, interaction: impl Into<InteractionTrigger>) -> Self {
        self.interaction = interaction.into();
        self
    }

    pub fn with_auto_pan(mut self, auto_pan: impl Into<AutoPan>) -> Self {
        self.auto_pan = auto_pan.into();
        self
    }

    pub fn with_ignore_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&InfoContent) -> String + 'static,
    {
        self.renderer = Rc::new(renderer);
        self
    }
}

/// State shared with the selection listener.
struct Shared {
    content: InfoContent,
    overlay: Option<Handle<Overlay>>,
    renderer: Renderer,
    body: DomNode,
    view_projection: Projection,
}

impl Shared {
    fn refresh(&self) {
        self.body.set_content((self.renderer)(&self.content));
    }
}

struct AttachedSelect {
    map: MapHandle,
    select: Handle<Select>,
    key: ListenerKey,
}

struct AttachedOverlay {
    map: MapHandle,
    overlay: Handle<Overlay>,
}

/// Popup showing the selected feature next to it on the map.
pub struct InfoWindow {
    props: InfoWindowProps,
    shared: Rc<RefCell<Shared>>,
    select: Option<AttachedSelect>,
    overlay: Option<AttachedOverlay>,
    select_deps: EffectDeps<Option<u64>>,
    overlay_deps: EffectDeps<Option<u64>>,
}

fn ignore_filter(ignore_types: Vec<String>) -> FeatureFilter {
    Rc::new(move |feature: &Feature| {
        feature
            .effective_feature_type()
            .map_or(true, |t| !ignore_types.iter().any(|ignored| ignored == t))
    })
}

fn show_info_window(shared: &RefCell<Shared>, select: &Handle<Select>, event: &SelectEvent) {
    let mut state = shared.borrow_mut();
    let position = match event.selected.first() {
        None => None,
        Some(feature) if feature.is_aggregate() => {
            let members = feature.features();
            state.content.feature = members[0].payload().cloned();
            state.content.features = members.to_vec();
            feature.geometry().map(|g| g.anchor())
        }
        Some(feature) => {
            state.content.features.clear();
            match feature.payload() {
                Some(Payload::Path(points)) => {
                    state.content.feature = Some(Payload::Path(Rc::clone(points)));
                    points.get(points.len() / 2).map(|middle| {
                        transform(middle.lon_lat(), Projection::Epsg4326, state.view_projection)
                    })
                }
                payload => {
                    state.content.feature = payload.cloned();
                    feature.geometry().map(|g| g.anchor())
                }
            }
        }
    };

    if let Some(overlay) = &state.overlay {
        overlay.borrow_mut().set_position(position);
    }
    if position.is_none() {
        select.borrow_mut().clear_selection();
    }
    state.refresh();
}

impl InfoWindow {
    pub fn new(props: InfoWindowProps) -> Self {
        let body = DomNode::new(format!("ol-popup ol-popup-layer {INFO_WINDOW_CLASS}"));
        let shared = Shared {
            content: InfoContent::default(),
            overlay: None,
            renderer: props.renderer.clone(),
            body,
            view_projection: Projection::default(),
        };
        Self {
            props,
            shared: Rc::new(RefCell::new(shared)),
            select: None,
            overlay: None,
            select_deps: EffectDeps::new(),
            overlay_deps: EffectDeps::new(),
        }
    }

    /// The node the renderer output is written to.
    pub fn body(&self) -> DomNode {
        self.shared.borrow().body.clone()
    }

    pub fn content(&self) -> InfoContent {
        self.shared.borrow().content.clone()
    }

    pub fn select(&self) -> Option<&Handle<Select>> {
        self.select.as_ref().map(|a| &a.select)
    }

    pub fn overlay(&self) -> Option<&Handle<Overlay>> {
        self.overlay.as_ref().map(|a| &a.overlay)
    }

    fn attach_select(&mut self, map: MapHandle) {
        let filter = ignore_filter(self.props.ignore_types.clone());
        let select = Handle::new(Select::new(self.props.interaction.condition()).with_filter(filter));
        self.shared.borrow_mut().view_projection = map.borrow().view().projection();

        let shared = Rc::clone(&self.shared);
        let target = select.clone();
        let key = select
            .borrow_mut()
            .on_select(move |event| show_info_window(&shared, &target, event));
        map.borrow_mut().add_interaction(select.as_interaction());
        log::debug!("info window adding {:?} interaction", self.props.interaction);
        self.select = Some(AttachedSelect { map, select, key });
    }

    fn detach_select(&mut self) {
        if let Some(attached) = self.select.take() {
            attached.select.borrow_mut().un(attached.key);
            attached.map.borrow_mut().remove_interaction(attached.select.id());
        }
    }

    fn attach_overlay(&mut self, map: MapHandle) {
        let overlay = Handle::new(Overlay::new(self.body()).with_auto_pan(self.props.auto_pan));
        map.borrow_mut().add_overlay(overlay.clone());
        log::debug!("info window adding overlay {}", overlay.id());
        self.shared.borrow_mut().overlay = Some(overlay.clone());
        self.overlay = Some(AttachedOverlay { map, overlay });
    }

    fn detach_overlay(&mut self) {
        if let Some(attached) = self.overlay.take() {
            log::debug!("info window removing overlay {}", attached.overlay.id());
            attached.map.borrow_mut().remove_overlay(attached.overlay.id());
            self.shared.borrow_mut().overlay = None;
        }
    }
}

impl Default for InfoWindow {
    fn default() -> Self {
        Self::new(InfoWindowProps::default())
    }
}

impl Component for InfoWindow {
    fn name(&self) -> &str {
        "info-window"
    }

    fn render(&mut self, ctx: &MapContext) -> Result<()> {
        let body = self.body();
        if !body.is_attached() {
            body.attach();
        }

        let map = ctx.map();
        let map_id = map.as_ref().map(Handle::id);
        if self.select_deps.changed(map_id) {
            self.detach_select();
            if let Some(map) = &map {
                self.attach_select(map.clone());
            }
        }
        if self.overlay_deps.changed(map_id) {
            self.detach_overlay();
            if let Some(map) = map {
                self.attach_overlay(map);
            }
        }

        let mut shared = self.shared.borrow_mut();
        shared.renderer = self.props.renderer.clone();
        shared.refresh();
        Ok(())
    }

    fn unmount(&mut self, _ctx: &MapContext) -> Result<()> {
        self.detach_select();
        self.detach_overlay();
        self.select_deps.reset();
        self.overlay_deps.reset();
        self.body().detach();
        Ok(())
    }
}

impl Configurable for InfoWindow {
    type Config = InfoWindowProps;

    fn config(&self) -> &InfoWindowProps {
        &self.props
    }

    fn set_config(&mut self, config: InfoWindowProps) -> Result<()> {
        self.props = config;
        Ok(())
    }
}
