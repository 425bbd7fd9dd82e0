use std::rc::Rc;

use crate::core::geo::Coordinate;
use crate::engine::feature::{Feature, FeatureRef, Geometry};
use crate::engine::map::{BrowserEventKind, MapBrowserEvent};
use crate::engine::vector::VectorSource;
use crate::engine::{Deferred, Handle, ListenerKey, Listeners};
use crate::traits::AsAny;

/// Reacts to browser events dispatched through a map. Work that calls back
/// into other objects is returned as [`Deferred`] and run by the map once
/// this interaction is no longer borrowed.
pub trait Interaction: AsAny {
    fn name(&self) -> &'static str;

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    /// `hits` are the features under the event coordinate, topmost first.
    fn handle_event(&mut self, event: &MapBrowserEvent, hits: &[FeatureRef]) -> Vec<Deferred>;
}

/// Which browser event triggers a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Condition {
    Click,
    #[default]
    SingleClick,
    PointerMove,
}

impl Condition {
    pub fn matches(&self, kind: BrowserEventKind) -> bool {
        matches!(
            (self, kind),
            (Condition::Click, BrowserEventKind::Click)
                | (Condition::SingleClick, BrowserEventKind::SingleClick)
                | (Condition::PointerMove, BrowserEventKind::PointerMove)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectEvent {
    pub selected: Vec<FeatureRef>,
    pub deselected: Vec<FeatureRef>,
}

pub type FeatureFilter = Rc<dyn Fn(&Feature) -> bool>;

/// Single-feature selection driven by a [`Condition`].
pub struct Select {
    condition: Condition,
    filter: Option<FeatureFilter>,
    selected: Vec<FeatureRef>,
    listeners: Listeners<SelectEvent>,
    active: bool,
}

impl Select {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            filter: None,
            selected: Vec::new(),
            listeners: Listeners::new(),
            active: true,
        }
    }

    pub fn with_filter(mut self, filter: FeatureFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn selected(&self) -> &[FeatureRef] {
        &self.selected
    }

    /// Drops the current selection without notifying listeners.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn on_select<F>(&mut self, callback: F) -> ListenerKey
    where
        F: Fn(&SelectEvent) + 'static,
    {
        self.listeners.add(Rc::new(callback))
    }

    pub fn un(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Selects the first hit passing the filter. Returns the event and the
    /// listeners to notify when the selection changed.
    fn apply(&mut self, hits: &[FeatureRef]) -> Option<(SelectEvent, Vec<Rc<dyn Fn(&SelectEvent)>>)> {
        let next: Vec<FeatureRef> = hits
            .iter()
            .find(|f| self.filter.as_ref().map_or(true, |filter| filter(f)))
            .cloned()
            .into_iter()
            .collect();

        let same = next.len() == self.selected.len()
            && next.iter().zip(&self.selected).all(|(a, b)| a.id() == b.id());
        if same {
            return None;
        }

        let deselected = self
            .selected
            .iter()
            .filter(|old| !next.iter().any(|n| n.id() == old.id()))
            .cloned()
            .collect();
        let selected = next
            .iter()
            .filter(|n| !self.selected.iter().any(|old| old.id() == n.id()))
            .cloned()
            .collect();
        self.selected = next;
        Some((
            SelectEvent {
                selected,
                deselected,
            },
            self.listeners.snapshot(),
        ))
    }
}

impl Handle<Select> {
    /// Applies `hits` as if the trigger event had fired over them.
    pub fn select_from(&self, hits: &[FeatureRef]) {
        let outcome = self.borrow_mut().apply(hits);
        if let Some((event, callbacks)) = outcome {
            for callback in callbacks {
                callback(&event);
            }
        }
    }
}

impl Interaction for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn handle_event(&mut self, event: &MapBrowserEvent, hits: &[FeatureRef]) -> Vec<Deferred> {
        if !self.active || !self.condition.matches(event.kind) {
            return Vec::new();
        }
        match self.apply(hits) {
            Some((event, callbacks)) => vec![Box::new(move |_| {
                for callback in callbacks {
                    callback(&event);
                }
            })],
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Point,
    Polygon,
    Circle,
}

/// Sketches geometries from clicks and adds them to a source. Polygons are
/// finished by a double click, circles by the click setting the radius.
pub struct Draw {
    mode: DrawMode,
    source: Handle<VectorSource>,
    sketch: Vec<Coordinate>,
    active: bool,
}

impl Draw {
    pub fn new(mode: DrawMode, source: Handle<VectorSource>) -> Self {
        Self {
            mode,
            source,
            sketch: Vec::new(),
            active: true,
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn sketch(&self) -> &[Coordinate] {
        &self.sketch
    }

    fn step(&mut self, kind: BrowserEventKind, at: Coordinate) -> Option<Geometry> {
        match (self.mode, kind) {
            (DrawMode::Point, BrowserEventKind::Click) => Some(Geometry::Point(at)),
            (DrawMode::Polygon, BrowserEventKind::Click) => {
                self.sketch.push(at);
                None
            }
            (DrawMode::Polygon, BrowserEventKind::DoubleClick) if self.sketch.len() >= 3 => {
                let mut ring = std::mem::take(&mut self.sketch);
                ring.push(ring[0]);
                Some(Geometry::Polygon(vec![ring]))
            }
            (DrawMode::Circle, BrowserEventKind::Click) => match self.sketch.first() {
                None => {
                    self.sketch.push(at);
                    None
                }
                Some(center) => {
                    let center = *center;
                    self.sketch.clear();
                    Some(Geometry::Circle {
                        center,
                        radius: center.distance_to(&at),
                    })
                }
            },
            _ => None,
        }
    }
}

impl Interaction for Draw {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.sketch.clear();
        }
    }

    fn handle_event(&mut self, event: &MapBrowserEvent, _hits: &[FeatureRef]) -> Vec<Deferred> {
        if !self.active {
            return Vec::new();
        }
        match self.step(event.kind, event.coordinate) {
            Some(geometry) => {
                let source = self.source.clone();
                vec![Box::new(move |_| {
                    source.add_feature(Feature::new(geometry).into_ref());
                })]
            }
            None => Vec::new(),
        }
    }
}

/// Zooms the view to a box dragged by the user.
pub struct DragZoom {
    active: bool,
}

impl DragZoom {
    pub fn new() -> Self {
        Self { active: true }
    }
}

impl Default for DragZoom {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction for DragZoom {
    fn name(&self) -> &'static str {
        "drag-zoom"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn handle_event(&mut self, event: &MapBrowserEvent, _hits: &[FeatureRef]) -> Vec<Deferred> {
        match (self.active, event.kind, event.extent) {
            (true, BrowserEventKind::BoxEnd, Some(extent)) => vec![Box::new(move |map| {
                map.borrow_mut().fit(&extent);
            })],
            _ => Vec::new(),
        }
    }
}
