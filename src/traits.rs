//! Shared trait abstractions for common patterns
//!
//! Components, layers and interactions are stored behind trait objects and
//! recovered through [`AsAny`]. Every component exposes its props through
//! [`Configurable`].

use crate::Result;
use std::any::Any;

/// Dynamic casting support for trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for objects with configuration
/// Standardizes how component props are read, replaced and validated
pub trait Configurable {
    type Config: Clone;

    /// Get the current configuration
    fn config(&self) -> &Self::Config;

    /// Set new configuration
    fn set_config(&mut self, config: Self::Config) -> Result<()>;

    /// Validate configuration
    fn validate_config(config: &Self::Config) -> Result<()> {
        let _ = config; // Default implementation accepts all configs
        Ok(())
    }

    /// Update configuration with a partial change
    fn update_config<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut Self::Config),
    {
        let mut config = self.config().clone();
        updater(&mut config);
        Self::validate_config(&config)?;
        self.set_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;

    #[derive(Clone, Default)]
    struct Zoom {
        level: f64,
    }

    struct Widget {
        config: Zoom,
    }

    impl Configurable for Widget {
        type Config = Zoom;

        fn config(&self) -> &Zoom {
            &self.config
        }

        fn set_config(&mut self, config: Zoom) -> Result<()> {
            self.config = config;
            Ok(())
        }

        fn validate_config(config: &Zoom) -> Result<()> {
            if config.level < 0.0 {
                return Err(MapError::Configuration("negative zoom".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_update_config_validates_before_applying() {
        let mut widget = Widget {
            config: Zoom { level: 3.0 },
        };

        widget.update_config(|c| c.level = 5.0).unwrap();
        assert_eq!(widget.config().level, 5.0);

        assert!(widget.update_config(|c| c.level = -1.0).is_err());
        assert_eq!(widget.config().level, 5.0);
    }

    #[test]
    fn test_as_any_downcast() {
        let mut widget = Widget {
            config: Zoom::default(),
        };
        let any: &mut dyn AsAny = &mut widget;
        assert!((*any).as_any().downcast_ref::<Widget>().is_some());
        assert!((*any).as_any_mut().downcast_mut::<Zoom>().is_none());
    }
}
