use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::next_id;

#[derive(Debug, Default)]
struct NodeState {
    class: String,
    attached: bool,
    visible: bool,
    content: String,
    style: Vec<(String, String)>,
}

/// A host element owned by a component: the map target, an overlay's
/// element, a popup body.
#[derive(Debug, Clone)]
pub struct DomNode {
    id: u64,
    state: Rc<RefCell<NodeState>>,
}

impl DomNode {
    /// A detached node with the given CSS class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            state: Rc::new(RefCell::new(NodeState {
                class: class.into(),
                visible: true,
                ..Default::default()
            })),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn class(&self) -> String {
        self.state.borrow().class.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state
            .borrow()
            .class
            .split_whitespace()
            .any(|c| c == class)
    }

    /// Marks the node as committed to the host document.
    pub fn attach(&self) {
        self.state.borrow_mut().attached = true;
    }

    pub fn detach(&self) {
        self.state.borrow_mut().attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.state.borrow_mut().content = content.into();
    }

    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Sets an inline style property, replacing any previous value.
    pub fn set_style(&self, property: &str, value: impl Into<String>) {
        let mut state = self.state.borrow_mut();
        let value = value.into();
        match state.style.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value,
            None => state.style.push((property.to_string(), value)),
        }
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.state
            .borrow()
            .style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.clone())
    }
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DomNode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_lifecycle() {
        let node = DomNode::new("ol-popup grove-info-window");
        assert!(!node.is_attached());
        assert!(node.has_class("grove-info-window"));

        node.attach();
        node.set_content("<b>hi</b>");
        node.set_style("width", "100%");
        node.set_style("width", "50%");

        assert!(node.is_attached());
        assert_eq!(node.content(), "<b>hi</b>");
        assert_eq!(node.style("width").as_deref(), Some("50%"));
        assert_eq!(node, node.clone());
        assert_ne!(node, DomNode::new("ol-popup"));
    }
}
