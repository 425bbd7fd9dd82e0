#![allow(dead_code)]

use mapgrove::prelude::*;
use serde_json::{json, Value};

/// Routes library logging to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn records(values: Vec<Value>) -> PropRef<Vec<FeatureRecord>> {
    PropRef::new(values.into_iter().map(FeatureRecord::new).collect())
}

/// Styles for the `Foo` type with a text label.
pub fn foo_styles() -> PropRef<StyleConfig> {
    let config: StyleConfig = serde_json::from_value(json!({
        "Foo": {
            "circle": {"radius": 5, "fill": {"color": "red"}},
            "text": {"font": "12px sans-serif"}
        }
    }))
    .expect("valid style config");
    PropRef::new(config)
}

/// A provider holding a default map view and the given layer.
pub fn provider_with<C: Component + 'static>(key: &str, component: C) -> MapProvider {
    MapProvider::new()
        .with_child("map", MapView::default())
        .with_child(key, component)
}

pub fn map_of(provider: &MapProvider) -> MapHandle {
    provider.context().map().expect("map published")
}
