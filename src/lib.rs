//! # mapgrove
//!
//! Declarative map components on top of a retained map object graph.
//!
//! A [`MapProvider`] owns a tree of components that share one map through a
//! write-once [`MapContext`]. [`MapView`] builds the map and publishes it;
//! layer and overlay components ([`FeatureLayer`], [`LineStringLayer`],
//! [`InfoWindow`]) attach their own engine objects once the map is ready and
//! detach them again on unmount. [`SearchMapView`] is a self-contained faceted
//! search map that owns its map outright.
//!
//! The [`engine`] module is a renderer-free model of the mapping engine the
//! components drive: maps, views, layers, sources, overlays, interactions and
//! controls. Nothing is drawn; what a map holds and every change made to it
//! can be read back from the map itself.

pub mod components;
pub mod core;
pub mod data;
pub mod engine;
pub mod prelude;
pub mod search;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Extent,
    config::{ClusterConfig, MapViewConfig},
    geo::{from_lon_lat, to_lon_lat, transform, Coordinate, Projection},
};

pub use components::{
    context::MapContext,
    feature_layer::{FeatureLayer, FeatureLayerProps},
    info_window::{InfoContent, InfoWindow, InfoWindowProps, InteractionTrigger},
    line_string_layer::{LineStringLayer, LineStringLayerProps},
    map_view::MapView,
    provider::{ChildKey, MapProvider},
    style_map::StyleConfig,
    Component,
};

pub use data::records::FeatureRecord;

pub use engine::{
    feature::{Feature, FeatureRef, Geometry, Payload},
    map::{Map, MapEvent},
    Handle, MapHandle,
};

pub use search::SearchMapView;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("A different map has already been published to this context")]
    MapAlreadyPublished,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
