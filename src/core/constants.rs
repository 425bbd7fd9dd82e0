//! Core constants derived from OpenLayers defaults and the component defaults.
//! Keeping them in a single place makes it easier to tweak library-wide magic numbers.

/// Map centre used when no centre is configured, as `[lon, lat]`.
pub const DEFAULT_CENTER_LON_LAT: [f64; 2] = [-95.79, 34.48];

/// Initial zoom level of a new view.
pub const DEFAULT_ZOOM: f64 = 4.0;

/// Zoom a view jumps to when fitting a zero-area extent and no max zoom is set.
pub const DEFAULT_MAX_ZOOM: f64 = 28.0;

/// CSS class of the map anchor element.
pub const DEFAULT_CSS_CLASS: &str = "olmap";

/// CSS class of the element an info window overlay is bound to.
pub const INFO_WINDOW_CLASS: &str = "grove-info-window";

/// View projection code.
pub const DEFAULT_VIEW_PROJECTION: &str = "EPSG:3857";

/// Projection of incoming feature records.
pub const DEFAULT_DATA_PROJECTION: &str = "EPSG:4326";

/// Bing imagery set used when only an API key is configured.
pub const DEFAULT_BING_IMAGERY_SET: &str = "AerialWithLabels";

/// `featureType` tag of feature layer points.
pub const DEFAULT_FEATURE_TYPE: &str = "point";

/// `featureType` tag of line string features.
pub const LINE_STRING_FEATURE_TYPE: &str = "LineString";

/// Effective feature type of an aggregate with more than one child.
pub const CLUSTER_FEATURE_TYPE: &str = "cluster";

/// Line string stroke colour.
pub const DEFAULT_LINE_COLOR: &str = "#ffcc33";

/// Line string stroke width in pixels.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Fill colour of the arrowhead glyph.
pub const DEFAULT_ARROW_COLOR: &str = "black";

/// Width and height of the arrowhead SVG canvas.
pub const DEFAULT_ARROW_SIZE: u32 = 450;

/// Icon scale applied to the arrowhead glyph.
pub const ARROW_ICON_SCALE: f64 = 0.04;

/// Pixel distance within which points are clustered.
pub const DEFAULT_CLUSTER_DISTANCE: f64 = 20.0;

/// Pixel radius used when hit-testing features under the pointer.
pub const HIT_TOLERANCE_PX: f64 = 5.0;

/// Map size used until the host reports one, in pixels.
pub const DEFAULT_MAP_SIZE: (f64, f64) = (800.0, 600.0);

/// Number of decimals shown by the mouse position control.
pub const MOUSE_POSITION_DECIMALS: usize = 4;

/// Upper bound on provider render passes before the tree is considered unstable.
pub const MAX_RENDER_PASSES: usize = 8;

/// Tile server selected by a fresh search map.
pub const DEFAULT_TILE_SERVER: &str = "arcgis-topo";

/// Duration of the search map popup pan animation.
pub const SEARCH_POPUP_PAN_MS: u32 = 250;

/// Zoom used when an existing search map re-centres on a single feature.
pub const SEARCH_SINGLE_FEATURE_ZOOM: f64 = 15.0;

/// Search map container width.
pub const SEARCH_MAP_WIDTH: &str = "100%";

/// Search map container height.
pub const SEARCH_MAP_HEIGHT: &str = "400px";

/// Marker colour of facet features without a colour property.
pub const DEFAULT_MARKER_COLOR: &str = "yellow";
