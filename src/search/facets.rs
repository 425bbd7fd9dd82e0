//! Search facets as delivered by the search backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::bounds::Extent;
use crate::core::geo::Coordinate;
use crate::data::geojson::GeoJsonFeature;
use crate::Result;

/// Legend colours, handed out to geo facets in order.
pub const FACET_PALETTE: [&str; 8] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#9a6324",
];

pub fn palette_color(index: usize) -> &'static str {
    FACET_PALETTE[index % FACET_PALETTE.len()]
}

/// One geographic bucket of a facet: a lon/lat box and its hit count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetBox {
    pub id: Option<String>,
    pub label: Option<String>,
    pub count: u64,
    pub uri: Option<String>,
    pub w: f64,
    pub s: f64,
    pub e: f64,
    pub n: f64,
}

impl FacetBox {
    pub fn extent(&self) -> Extent {
        Extent::from_coords(self.w, self.s, self.e, self.n)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.w + self.e) / 2.0, (self.s + self.n) / 2.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Facet {
    pub name: String,
    pub boxes: Vec<FacetBox>,
    /// Ready-made features, used when the backend returns shapes instead
    /// of boxes.
    pub features: Vec<GeoJsonFeature>,
    pub limit_exceeded: bool,
}

impl Facet {
    /// Number of result entries the legend reports.
    pub fn entry_count(&self) -> usize {
        if self.boxes.is_empty() {
            self.features.len()
        } else {
            self.boxes.len()
        }
    }
}

/// Facets keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facets(BTreeMap<String, Facet>);

impl Facets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_facet(mut self, key: impl Into<String>, facet: Facet) -> Self {
        self.insert(key, facet);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, facet: Facet) {
        self.0.insert(key.into(), facet);
    }

    pub fn get(&self, key: &str) -> Option<&Facet> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Facet)> {
        self.0.iter()
    }
}

/// A facet chosen for display with its legend colour.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFacet {
    /// Facet key, also the `layer` property of its features.
    pub name: String,
    pub facet: Facet,
    pub color: String,
}

impl GeoFacet {
    /// Legend label: facet name, a `!!` marker when the backend truncated
    /// the result, and the entry count.
    pub fn legend_label(&self) -> String {
        let name = if self.facet.name.is_empty() {
            &self.name
        } else {
            &self.facet.name
        };
        let marker = if self.facet.limit_exceeded { "!!" } else { "" };
        format!("{name}{marker} ({})", self.facet.entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facets_from_json() {
        let facets = Facets::from_json_str(
            r#"{"geo": {"name": "Places", "limitExceeded": true,
                 "boxes": [{"id": "b1", "count": 3, "w": 0, "s": 0, "e": 2, "n": 4}]}}"#,
        )
        .unwrap();
        let facet = facets.get("geo").unwrap();
        assert!(facet.limit_exceeded);
        assert_eq!(facet.boxes[0].center(), Coordinate::new(1.0, 2.0));
        assert_eq!(facet.entry_count(), 1);
    }

    #[test]
    fn test_legend_label() {
        let geo = GeoFacet {
            name: "geo".to_string(),
            facet: Facet {
                limit_exceeded: true,
                boxes: vec![FacetBox::default(), FacetBox::default()],
                ..Default::default()
            },
            color: palette_color(0).to_string(),
        };
        assert_eq!(geo.legend_label(), "geo!! (2)");
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(FACET_PALETTE.len()), palette_color(0));
    }
}
