//! Input data: feature records, GeoJSON documents and the helpers turning
//! search facets into GeoJSON.

pub mod conversion;
pub mod geojson;
pub mod records;
