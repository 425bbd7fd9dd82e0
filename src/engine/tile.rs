//! Raster base layers and the tile server catalog

use once_cell::sync::Lazy;

use crate::core::geo::Projection;
use crate::engine::layer::{Layer, LayerProperties, LayerType};

const OSM_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const ARCGIS_SERVER: &str = "https://server.arcgisonline.com/ArcGIS/rest/services/";
const ARCGIS_ATTRIBUTION: &str =
    "Tiles © <a href=\"https://services.arcgisonline.com/ArcGIS/rest/services/\">ArcGIS</a>";

#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    Osm,
    Xyz {
        url: String,
        attribution: String,
        projection: Projection,
        tile_size: u32,
        max_zoom: Option<u8>,
        /// Added to the zoom level when expanding the URL template.
        zoom_offset: i32,
    },
    Bing {
        api_key: String,
        imagery_set: String,
    },
}

impl TileSource {
    pub fn xyz(url: impl Into<String>, attribution: impl Into<String>) -> Self {
        TileSource::Xyz {
            url: url.into(),
            attribution: attribution.into(),
            projection: Projection::Epsg3857,
            tile_size: 256,
            max_zoom: None,
            zoom_offset: 0,
        }
    }

    pub fn projection(&self) -> Projection {
        match self {
            TileSource::Xyz { projection, .. } => *projection,
            _ => Projection::Epsg3857,
        }
    }

    /// URL of a tile. Bing tiles are addressed through imagery metadata the
    /// engine does not fetch, so they have no static URL.
    pub fn tile_url(&self, z: u32, x: u32, y: u32) -> Option<String> {
        let (template, z) = match self {
            TileSource::Osm => (OSM_URL, z as i64),
            TileSource::Xyz {
                url, zoom_offset, ..
            } => (url.as_str(), z as i64 + *zoom_offset as i64),
            TileSource::Bing { .. } => return None,
        };
        Some(
            template
                .replace("{z}", &z.to_string())
                .replace("{x}", &x.to_string())
                .replace("{y}", &y.to_string()),
        )
    }
}

/// An entry in the tile server catalog.
#[derive(Debug, Clone)]
pub struct TileServer {
    pub key: &'static str,
    pub label: &'static str,
    pub source: TileSource,
}

fn arcgis(key: &'static str, label: &'static str, service: &str) -> TileServer {
    TileServer {
        key,
        label,
        source: TileSource::xyz(
            format!("{ARCGIS_SERVER}{service}/MapServer/tile/{{z}}/{{y}}/{{x}}"),
            ARCGIS_ATTRIBUTION,
        ),
    }
}

pub static TILE_SERVERS: Lazy<Vec<TileServer>> = Lazy::new(|| {
    vec![
        TileServer {
            key: "osm",
            label: "OpenStreetMap",
            source: TileSource::Osm,
        },
        TileServer {
            key: "arcgis-2d",
            label: "ArcGIS ESRI 2D",
            source: TileSource::Xyz {
                url: "https://services.arcgisonline.com/arcgis/rest/services/ESRI_Imagery_World_2D/MapServer/tile/{z}/{y}/{x}".to_string(),
                attribution: "Copyright:© 2013 ESRI, i-cubed, GeoEye".to_string(),
                projection: Projection::Epsg4326,
                tile_size: 512,
                max_zoom: Some(16),
                zoom_offset: -1,
            },
        },
        arcgis("arcgis-natgeo", "ArcGIS NatGeo", "NatGeo_World_Map"),
        arcgis("arcgis-usa", "ArcGIS USA Topo", "USA_Topo_Maps"),
        arcgis("arcgis-imagery", "ArcGIS Imagery", "World_Imagery"),
        arcgis("arcgis-physical", "ArcGIS Physical", "World_Physical_Map"),
        arcgis("arcgis-relief", "ArcGIS Relief", "World_Shaded_Relief"),
        arcgis("arcgis-street", "ArcGIS Street", "World_Street_Map"),
        arcgis("arcgis-terrain", "ArcGIS Terrain", "World_Terrain_Base"),
        arcgis("arcgis-topo", "ArcGIS Topo", "World_Topo_Map"),
    ]
});

/// Source for a catalog key. `arcgis` is an alias of `arcgis-topo`; unknown
/// keys fall back to OpenStreetMap.
pub fn tile_source_for_server(key: &str) -> TileSource {
    let key = key.to_ascii_lowercase();
    let key = if key == "arcgis" { "arcgis-topo" } else { key.as_str() };
    match TILE_SERVERS.iter().find(|s| s.key == key) {
        Some(server) => server.source.clone(),
        None => {
            log::debug!("unknown tile server {key}, using OpenStreetMap");
            TileSource::Osm
        }
    }
}

/// View projection a tile server needs.
pub fn map_projection_for_server(key: &str) -> Projection {
    if key == "arcgis-2d" {
        Projection::Epsg4326
    } else {
        Projection::Epsg3857
    }
}

pub struct TileLayer {
    properties: LayerProperties,
    source: TileSource,
}

impl TileLayer {
    pub fn new(source: TileSource) -> Self {
        Self {
            properties: LayerProperties::new("base", LayerType::Tile),
            source,
        }
    }

    pub fn source(&self) -> &TileSource {
        &self.source
    }

    pub fn set_source(&mut self, source: TileSource) {
        self.source = source;
    }
}

impl Layer for TileLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arcgis_2d_uses_previous_zoom_and_geographic_grid() {
        let source = tile_source_for_server("arcgis-2d");
        assert_eq!(source.projection(), Projection::Epsg4326);
        assert_eq!(
            source.tile_url(3, 5, 2).unwrap(),
            "https://services.arcgisonline.com/arcgis/rest/services/ESRI_Imagery_World_2D/MapServer/tile/2/2/5"
        );
        assert_eq!(map_projection_for_server("arcgis-2d"), Projection::Epsg4326);
    }

    #[test]
    fn test_topo_alias_and_fallback() {
        assert_eq!(tile_source_for_server("arcgis"), tile_source_for_server("arcgis-topo"));
        assert_eq!(tile_source_for_server("nope"), TileSource::Osm);
        assert_eq!(map_projection_for_server("arcgis-topo"), Projection::Epsg3857);
        assert_eq!(
            tile_source_for_server("arcgis-street").tile_url(1, 0, 1).unwrap(),
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/1/1/0"
        );
    }

    #[test]
    fn test_bing_has_no_static_url() {
        let source = TileSource::Bing {
            api_key: "k".to_string(),
            imagery_set: "Road".to_string(),
        };
        assert!(source.tile_url(0, 0, 0).is_none());
        assert_eq!(TileSource::Osm.tile_url(2, 1, 3).unwrap(), "https://tile.openstreetmap.org/2/1/3.png");
    }
}
