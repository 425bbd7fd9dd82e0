//! Configuration for map construction
//!
//! [`MapViewConfig`] is read once when a map view builds its map. It
//! deserializes from camelCase JSON and every field has a default, so a
//! partial document such as `{"zoom": 6}` is a valid configuration.

use crate::core::constants::{
    DEFAULT_BING_IMAGERY_SET, DEFAULT_CENTER_LON_LAT, DEFAULT_CLUSTER_DISTANCE,
    DEFAULT_CSS_CLASS, DEFAULT_VIEW_PROJECTION, DEFAULT_ZOOM,
};
use crate::core::geo::Projection;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapViewConfig {
    pub projection: String,
    /// `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub css_class: String,
    pub allow_full_screen: bool,
    pub show_mouse_position: bool,
    /// Tile server catalog key used instead of OpenStreetMap.
    pub base_layer_key: Option<String>,
    #[serde(alias = "bingAPIKey")]
    pub bing_api_key: Option<String>,
    pub bing_imagery_set: Option<String>,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            projection: DEFAULT_VIEW_PROJECTION.to_string(),
            center: DEFAULT_CENTER_LON_LAT,
            zoom: DEFAULT_ZOOM,
            min_zoom: None,
            max_zoom: None,
            css_class: DEFAULT_CSS_CLASS.to_string(),
            allow_full_screen: true,
            show_mouse_position: true,
            base_layer_key: None,
            bing_api_key: None,
            bing_imagery_set: None,
        }
    }
}

/// Which base tile layer a map view starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseLayerConfig {
    Osm,
    Bing { api_key: String, imagery_set: String },
    Server(String),
}

impl MapViewConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn projection(&self) -> Result<Projection> {
        self.projection.parse()
    }

    /// A configured Bing key wins over a catalog key, which wins over OSM.
    pub fn base_layer(&self) -> BaseLayerConfig {
        match (&self.bing_api_key, &self.base_layer_key) {
            (Some(key), _) if !key.is_empty() => BaseLayerConfig::Bing {
                api_key: key.clone(),
                imagery_set: self
                    .bing_imagery_set
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BING_IMAGERY_SET.to_string()),
            },
            (_, Some(server)) => BaseLayerConfig::Server(server.clone()),
            _ => BaseLayerConfig::Osm,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.projection()?;
        if !self.zoom.is_finite() {
            return Err(MapError::Configuration(format!(
                "zoom must be finite, got {}",
                self.zoom
            )));
        }
        if let (Some(min), Some(max)) = (self.min_zoom, self.max_zoom) {
            if min > max {
                return Err(MapError::Configuration(format!(
                    "min zoom {min} exceeds max zoom {max}"
                )));
            }
        }
        if self.center.iter().any(|v| !v.is_finite()) {
            return Err(MapError::InvalidCoordinates(format!(
                "{:?}",
                self.center
            )));
        }
        Ok(())
    }
}

/// Distance-based point clustering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    /// Pixel distance within which features are grouped.
    pub distance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            distance: DEFAULT_CLUSTER_DISTANCE,
        }
    }
}
