use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::MapHandle;
use crate::{MapError, Result};

#[derive(Debug, Default)]
struct Slot {
    map: Option<MapHandle>,
    version: u64,
}

/// Write-once broadcast slot for the map shared by one provider subtree.
///
/// Clones share the slot. The version counts successful publications, which
/// is how the provider notices that consumers need another render.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    slot: Rc<RefCell<Slot>>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> Option<MapHandle> {
        self.slot.borrow().map.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.borrow().map.is_some()
    }

    /// Publishes `map`. Offering the already published handle again is a
    /// no-op; offering a different one fails and keeps the first.
    pub fn set_map(&self, map: MapHandle) -> Result<()> {
        let mut slot = self.slot.borrow_mut();
        match &slot.map {
            Some(current) if *current == map => Ok(()),
            Some(current) => {
                log::warn!(
                    "map {} offered to a context that already holds map {}",
                    map.id(),
                    current.id()
                );
                Err(MapError::MapAlreadyPublished)
            }
            None => {
                log::debug!("map {} published", map.id());
                slot.map = Some(map);
                slot.version += 1;
                Ok(())
            }
        }
    }

    pub fn version(&self) -> u64 {
        self.slot.borrow().version
    }

    /// Whether both contexts share one slot.
    pub fn same_slot(&self, other: &MapContext) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}
