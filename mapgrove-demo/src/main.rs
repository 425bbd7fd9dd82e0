//! Builds a small component tree without a browser, drives a few pointer
//! events through it and logs what the map ends up holding.

use anyhow::{Context, Result};
use mapgrove::prelude::*;
use mapgrove::search::bounds::BoxBounds;
use serde_json::json;

const STYLES: &str = r##"{
    "Depot": {
        "circle": {"radius": 7, "fill": {"color": "#1f78b4"}, "stroke": {"color": "#fff", "width": 2}},
        "text": {"font": "12px sans-serif", "offsetY": -14}
    },
    "Stop": {"circle": {"radius": 4, "fill": {"color": "#33a02c"}}}
}"##;

fn stops() -> PropRef<Vec<FeatureRecord>> {
    PropRef::new(
        [
            json!({"type": "Depot", "name": "North depot", "location": {"longitude": -97.74, "latitude": 30.27}}),
            json!({"type": "Stop", "name": "Elm", "geometry": {"coordinates": [-97.70, 30.30]}}),
            json!({"type": "Stop", "name": "Oak", "geometry": {"long": -97.65, "lat": 30.33}}),
        ]
        .into_iter()
        .map(FeatureRecord::new)
        .collect(),
    )
}

fn route() -> PropRef<Vec<FeatureRecord>> {
    PropRef::new(
        [[-97.74, 30.27], [-97.70, 30.30], [-97.65, 30.33]]
            .into_iter()
            .map(|at| FeatureRecord::new(json!(at)))
            .collect(),
    )
}

fn run_components() -> Result<()> {
    let styles: StyleConfig = serde_json::from_str(STYLES).context("parsing styles")?;
    let config = MapViewConfig::from_json_str(r#"{"center": [-97.7, 30.3], "zoom": 11}"#)?;

    let mut provider = MapProvider::new()
        .with_child("map", MapView::new(config))
        .with_child(
            "stops",
            FeatureLayer::new(
                FeatureLayerProps::new("stops")
                    .with_style_map(PropRef::new(styles))
                    .with_features(stops()),
            ),
        )
        .with_child(
            "route",
            LineStringLayer::new(
                LineStringLayerProps::default()
                    .with_features(route())
                    .with_arrows(true),
            ),
        )
        .with_child(
            "popup",
            InfoWindow::new(InfoWindowProps::default().with_renderer(|content: &InfoContent| {
                let name = content
                    .feature
                    .as_ref()
                    .and_then(Payload::display_name)
                    .unwrap_or_else(|| "route".to_string());
                format!("<h4>{name}</h4>")
            })),
        );
    provider.mount()?;

    let map = provider.context().map().context("map view published no map")?;
    log::info!("map has {} layers", map.borrow().layers().len());

    let depot = provider
        .child::<FeatureLayer>("stops")
        .and_then(|layer| layer.source())
        .and_then(|source| source.borrow().features().first().cloned())
        .context("stops layer has no features")?;
    map.click_feature(BrowserEventKind::SingleClick, &depot);

    if let Some(window) = provider.child::<InfoWindow>("popup") {
        let position = window.overlay().and_then(|o| o.borrow().position());
        log::info!(
            "info window at {:?}: {}",
            position.map(to_lon_lat),
            window.body().content()
        );
    }

    for rendered in map.borrow().render_frame() {
        let label = rendered
            .styles
            .first()
            .and_then(|s| s.text())
            .and_then(|t| t.text.clone());
        log::debug!("layer {} feature {} label {:?}", rendered.layer_id, rendered.feature.id(), label);
    }

    provider.unmount()?;
    log::info!("unmounted, map target attached: {}", map.borrow().target().is_some());
    Ok(())
}

fn run_search_map() -> Result<()> {
    let facets = Facets::from_json_str(
        r#"{"geo": {"name": "Places", "boxes": [
            {"id": "tx", "label": "Texas", "count": 12, "w": -100, "s": 30, "e": -96, "n": 34},
            {"id": "ok", "label": "Oklahoma", "count": 3, "w": -98, "s": 34, "e": -96, "n": 36}
        ]}}"#,
    )?;
    let mut view = SearchMapView::new(
        SearchMapProps::default()
            .with_facets(PropRef::new(facets))
            .with_geo_facet_names(["geo"])
            .on_bounds_changed(|bounds: &BoxBounds| {
                log::info!("search bounds now {}", json!(bounds));
            })
            .on_reset_map(|| log::info!("search map reset")),
    );
    view.mount()?;

    for entry in view.legend() {
        log::info!("legend: {} in {}", entry.label, entry.color);
    }

    let map = view.map().context("search map was not created")?;
    let texas = from_lon_lat(Coordinate::new(-98.0, 32.0));
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::SingleClick, texas));
    log::info!("popup: {}", view.popup_content().content());

    map.move_to(texas, Some(6.0));
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::ContextMenu, texas));

    view.unmount();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run_components()?;
    run_search_map()?;
    Ok(())
}
