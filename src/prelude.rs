//! Prelude module for common mapgrove types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapgrove::prelude::*;`

pub use crate::core::{
    bounds::Extent,
    color::Color,
    config::{BaseLayerConfig, ClusterConfig, MapViewConfig},
    geo::{from_lon_lat, to_lon_lat, transform, Coordinate, Projection},
};

pub use crate::components::{
    context::MapContext,
    deps::{EffectDeps, PropRef},
    feature_layer::{FeatureLayer, FeatureLayerProps},
    info_window::{InfoContent, InfoWindow, InfoWindowProps, InteractionTrigger},
    line_string_layer::{LineStringLayer, LineStringLayerProps},
    map_view::MapView,
    provider::{ChildKey, MapProvider},
    style_map::{parse_style_map, resolve_feature_style, StyleConfig, StyleMap},
    Component,
};

pub use crate::engine::{
    control::{Control, ControlKind},
    dom::DomNode,
    feature::{Feature, FeatureRef, Geometry, Payload},
    interaction::{Condition, Draw, DragZoom, Interaction, Select, SelectEvent},
    layer::{Layer, LayerType},
    map::{BrowserEventKind, Map, MapBrowserEvent, MapEvent},
    overlay::{AutoPan, Overlay},
    style::{CircleStyle, Fill, Icon, Stroke, Style, StyleFunction, Text},
    tile::{TileLayer, TileSource},
    vector::{VectorLayer, VectorSource},
    Handle, ListenerKey, MapHandle,
};

pub use crate::data::{
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
    records::FeatureRecord,
};

pub use crate::search::{facets::Facets, SearchMapView, SearchMapProps};

pub use crate::traits::{AsAny, Configurable};

pub use crate::{Error as MapError, Result};

pub use std::{cell::RefCell, rc::Rc};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
