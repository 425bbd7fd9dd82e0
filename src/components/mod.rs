//! Declarative components driving the engine
//!
//! A component is rendered by its [`provider::MapProvider`] whenever the tree
//! renders. Each render runs the component's effects, and each effect
//! decides from its own [`deps::EffectDeps`] whether it has work to do.
//! Resources attached by an effect are detached before the effect runs again
//! and when the component unmounts.

pub mod context;
pub mod deps;
pub mod feature_layer;
pub mod info_window;
pub mod line_string_layer;
pub mod map_view;
pub mod provider;
pub mod style_map;

use crate::components::context::MapContext;
use crate::traits::AsAny;
use crate::Result;

pub trait Component: AsAny {
    fn name(&self) -> &str;

    /// Runs the component's effects against the current context.
    fn render(&mut self, ctx: &MapContext) -> Result<()>;

    /// Releases everything the component attached to the map.
    fn unmount(&mut self, _ctx: &MapContext) -> Result<()> {
        Ok(())
    }
}
