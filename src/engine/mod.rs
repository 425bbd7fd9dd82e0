//! Retained map object graph
//!
//! Every engine object lives behind a [`Handle`], a shared mutable cell with a
//! process-unique id. Handles compare by identity, which is what the
//! component layer keys its effects on. Listener callbacks are always invoked
//! after the notifying object's borrow has been released.

pub mod cluster;
pub mod control;
pub mod dom;
pub mod feature;
pub mod interaction;
pub mod layer;
pub mod map;
pub mod overlay;
pub mod style;
pub mod tile;
pub mod vector;
pub mod view;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::interaction::Interaction;
use crate::engine::layer::Layer;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique object id.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Shared reference to an engine object.
pub struct Handle<T: ?Sized> {
    id: u64,
    inner: Rc<RefCell<T>>,
}

pub type MapHandle = Handle<map::Map>;

impl<T> Handle<T> {
    pub fn new(value: T) -> Self {
        Self {
            id: next_id(),
            inner: Rc::new(RefCell::new(value)),
        }
    }
}

impl<T: ?Sized> Handle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    /// Number of live handles to this object.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl<T: Layer + 'static> Handle<T> {
    /// The same layer viewed through the [`Layer`] trait.
    pub fn as_layer(&self) -> Handle<dyn Layer> {
        let inner: Rc<RefCell<dyn Layer>> = self.inner.clone();
        Handle { id: self.id, inner }
    }
}

impl<T: Interaction + 'static> Handle<T> {
    /// The same interaction viewed through the [`Interaction`] trait.
    pub fn as_interaction(&self) -> Handle<dyn Interaction> {
        let inner: Rc<RefCell<dyn Interaction>> = self.inner.clone();
        Handle { id: self.id, inner }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).finish()
    }
}

/// Returned by listener registration; pass it back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// Work produced while an object was borrowed, run once the borrow is released.
pub type Deferred = Box<dyn FnOnce(&MapHandle)>;

/// Listener registry for one event payload type.
pub(crate) struct Listeners<E: ?Sized> {
    entries: Vec<(ListenerKey, Rc<dyn Fn(&E)>)>,
}

impl<E: ?Sized> Listeners<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, callback: Rc<dyn Fn(&E)>) -> ListenerKey {
        let key = ListenerKey(next_id());
        self.entries.push((key, callback));
        key
    }

    pub fn remove(&mut self, key: ListenerKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        before != self.entries.len()
    }

    /// Callbacks to invoke, cloned so the owner can be released first.
    pub fn snapshot(&self) -> Vec<Rc<dyn Fn(&E)>> {
        self.entries.iter().map(|(_, cb)| Rc::clone(cb)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: ?Sized> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_handles_compare_by_identity() {
        let a = Handle::new(5);
        let b = Handle::new(5);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.handle_count(), 1);
    }

    #[test]
    fn test_listener_add_remove() {
        let hits = Rc::new(Cell::new(0));
        let mut listeners: Listeners<u32> = Listeners::new();
        let counter = Rc::clone(&hits);
        let key = listeners.add(Rc::new(move |n: &u32| counter.set(counter.get() + n)));

        for cb in listeners.snapshot() {
            cb(&3);
        }
        assert_eq!(hits.get(), 3);

        assert!(listeners.remove(key));
        assert!(!listeners.remove(key));
        assert!(listeners.is_empty());
    }
}
