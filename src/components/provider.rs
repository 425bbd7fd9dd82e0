use std::fmt;

use crate::components::context::MapContext;
use crate::components::Component;
use crate::core::constants::MAX_RENDER_PASSES;
use crate::traits::Configurable;
use crate::{MapError, Result};

/// Name of a child inside a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildKey(String);

impl ChildKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChildKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ChildKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Root of a component tree sharing one map.
///
/// Every mount gets a fresh [`MapContext`]. A render pass renders all
/// children in registration order; a pass that publishes a map is followed
/// by another, so children rendered before the publisher observe it too.
pub struct MapProvider {
    context: MapContext,
    children: Vec<(ChildKey, Box<dyn Component>)>,
    mounted: bool,
}

impl MapProvider {
    pub fn new() -> Self {
        Self {
            context: MapContext::new(),
            children: Vec::new(),
            mounted: false,
        }
    }

    pub fn with_child<C>(mut self, key: impl Into<ChildKey>, component: C) -> Self
    where
        C: Component + 'static,
    {
        let key = key.into();
        self.children.retain(|(k, _)| *k != key);
        self.children.push((key, Box::new(component)));
        self
    }

    /// Adds a child, rendering the tree when already mounted.
    pub fn add_child<C>(&mut self, key: impl Into<ChildKey>, component: C) -> Result<()>
    where
        C: Component + 'static,
    {
        let key = key.into();
        if self.position(&key).is_some() {
            return Err(MapError::Configuration(format!(
                "a child named '{key}' already exists"
            )));
        }
        self.children.push((key, Box::new(component)));
        if self.mounted {
            self.render()?;
        }
        Ok(())
    }

    pub fn context(&self) -> &MapContext {
        &self.context
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(MapError::Configuration(
                "provider is already mounted".to_string(),
            ));
        }
        self.context = MapContext::new();
        self.mounted = true;
        log::debug!("provider mounted with {} children", self.children.len());
        self.render()
    }

    /// Renders until no pass publishes a new map.
    pub fn render(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(MapError::Configuration(
                "provider must be mounted before rendering".to_string(),
            ));
        }
        for pass in 0..MAX_RENDER_PASSES {
            let version = self.context.version();
            for (_, child) in self.children.iter_mut() {
                child.render(&self.context)?;
            }
            if self.context.version() == version {
                return Ok(());
            }
            log::debug!("map context changed during render pass {}", pass);
        }
        Err(MapError::Configuration(format!(
            "render did not settle after {MAX_RENDER_PASSES} passes"
        )))
    }

    fn position(&self, key: &ChildKey) -> Option<usize> {
        self.children.iter().position(|(k, _)| k == key)
    }

    pub fn child<C: Component + 'static>(&self, key: impl Into<ChildKey>) -> Option<&C> {
        let index = self.position(&key.into())?;
        self.children[index].1.as_ref().as_any().downcast_ref::<C>()
    }

    pub fn child_mut<C: Component + 'static>(&mut self, key: impl Into<ChildKey>) -> Option<&mut C> {
        let index = self.position(&key.into())?;
        self.children[index].1.as_mut().as_any_mut().downcast_mut::<C>()
    }

    /// Changes a child's props and re-renders the tree.
    pub fn update<C, F>(&mut self, key: impl Into<ChildKey>, updater: F) -> Result<()>
    where
        C: Component + Configurable + 'static,
        F: FnOnce(&mut C::Config),
    {
        let key = key.into();
        let child = self.child_mut::<C>(key.clone()).ok_or_else(|| {
            MapError::Configuration(format!("no child '{key}' of the requested type"))
        })?;
        child.update_config(updater)?;
        if self.mounted {
            self.render()?;
        }
        Ok(())
    }

    /// Unmounts and removes one child.
    pub fn remove_child(&mut self, key: impl Into<ChildKey>) -> Result<Option<Box<dyn Component>>> {
        let Some(index) = self.position(&key.into()) else {
            return Ok(None);
        };
        let (key, mut child) = self.children.remove(index);
        if self.mounted {
            log::debug!("unmounting child '{}'", key);
            child.unmount(&self.context)?;
        }
        Ok(Some(child))
    }

    /// Unmounts every child, last registered first. All children are
    /// unmounted even when one fails; the first error is returned.
    pub fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;
        let mut first_error = None;
        for (key, child) in self.children.iter_mut().rev() {
            if let Err(err) = child.unmount(&self.context) {
                log::warn!("child '{}' failed to unmount: {}", key, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MapProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MapProvider {
    fn drop(&mut self) {
        if self.mounted {
            if let Err(err) = self.unmount() {
                log::warn!("error while tearing down provider: {}", err);
            }
        }
    }
}
