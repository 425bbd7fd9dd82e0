use crate::core::geo::Coordinate;
use crate::engine::dom::DomNode;

/// Whether an overlay pans the map into view when positioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoPan {
    #[default]
    Disabled,
    Enabled,
    Animated { duration_ms: u32 },
}

impl AutoPan {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AutoPan::Disabled)
    }

    pub fn duration_ms(&self) -> Option<u32> {
        match self {
            AutoPan::Animated { duration_ms } => Some(*duration_ms),
            _ => None,
        }
    }
}

impl From<bool> for AutoPan {
    fn from(value: bool) -> Self {
        if value {
            AutoPan::Enabled
        } else {
            AutoPan::Disabled
        }
    }
}

/// A number enables panning animated over that many milliseconds; zero disables it.
impl From<u32> for AutoPan {
    fn from(value: u32) -> Self {
        match value {
            0 => AutoPan::Disabled,
            duration_ms => AutoPan::Animated { duration_ms },
        }
    }
}

/// A DOM element pinned to a map coordinate. Hidden while it has no position.
#[derive(Debug)]
pub struct Overlay {
    element: DomNode,
    position: Option<Coordinate>,
    auto_pan: AutoPan,
}

impl Overlay {
    pub fn new(element: DomNode) -> Self {
        element.set_visible(false);
        Self {
            element,
            position: None,
            auto_pan: AutoPan::Disabled,
        }
    }

    pub fn with_auto_pan(mut self, auto_pan: AutoPan) -> Self {
        self.auto_pan = auto_pan;
        self
    }

    pub fn element(&self) -> &DomNode {
        &self.element
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<Coordinate>) {
        self.position = position;
        self.element.set_visible(position.is_some());
    }

    pub fn auto_pan(&self) -> AutoPan {
        self.auto_pan
    }

    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }
}
