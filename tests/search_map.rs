mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_relative_eq;
use common::init_logging;
use mapgrove::prelude::*;
use mapgrove::search::bounds::{BoxBounds, DrawingBounds};
use mapgrove::search::DrawTool;

const FACETS: &str = r#"{
    "geo": {"name": "Places", "boxes": [
        {"id": "tx", "label": "Texas", "count": 12, "uri": "urn:tx", "w": -100, "s": 30, "e": -96, "n": 34},
        {"id": "ok", "label": "Oklahoma", "count": 1, "w": -98, "s": 34, "e": -96, "n": 36}
    ]},
    "other": {"name": "Other", "limitExceeded": true, "boxes": [
        {"id": "nm", "label": "New Mexico", "count": 4, "w": -108, "s": 32, "e": -104, "n": 36}
    ]},
    "empty": {"name": "Nothing", "boxes": []}
}"#;

fn facets() -> PropRef<Facets> {
    PropRef::new(Facets::from_json_str(FACETS).unwrap())
}

fn props() -> SearchMapProps {
    SearchMapProps::default()
        .with_facets(facets())
        .with_geo_facet_names(["geo", "other", "empty"])
}

#[test]
fn legend_lists_facets_with_entries() {
    init_logging();
    let mut view = SearchMapView::new(props());
    view.mount().unwrap();

    let legend = view.legend();
    let labels: Vec<&str> = legend.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["Places (2)", "Other!! (1)"]);
    assert!(legend.iter().all(|e| e.visible));
    assert_ne!(legend[0].color, legend[1].color);

    assert_eq!(view.toggle_layer_visible(1), Some(false));
    assert!(!view.legend()[1].visible);
    assert!(!view.layers()[1].borrow().is_visible());
}

#[test]
fn moves_are_reported_after_the_first_one() {
    init_logging();
    let reported: Rc<RefCell<Vec<BoxBounds>>> = Rc::default();
    let sink = Rc::clone(&reported);
    let mut view = SearchMapView::new(
        props().on_bounds_changed(move |bounds| sink.borrow_mut().push(*bounds)),
    );
    view.mount().unwrap();
    assert!(reported.borrow().is_empty());

    let map = view.map().unwrap();
    map.move_to(from_lon_lat(Coordinate::new(10.0, 20.0)), Some(6.0));

    let reported = reported.borrow();
    assert_eq!(reported.len(), 1);
    let bounds = reported[0];
    assert!(bounds.west < 10.0 && 10.0 < bounds.east);
    assert!(bounds.south < 20.0 && 20.0 < bounds.north);
}

#[test]
fn drawn_point_is_reported_in_the_data_projection() {
    init_logging();
    let drawn: Rc<RefCell<Vec<DrawingBounds>>> = Rc::default();
    let sink = Rc::clone(&drawn);
    let mut view =
        SearchMapView::new(props().on_drawing_added(move |bounds| sink.borrow_mut().push(bounds.clone())));
    view.mount().unwrap();
    view.select_draw_mode(Some(DrawTool::Point));
    assert_eq!(view.interaction().unwrap().borrow().name(), "draw");

    let map = view.map().unwrap();
    let at = from_lon_lat(Coordinate::new(-97.5, 35.5));
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::Click, at));

    assert_eq!(view.drawings().unwrap().borrow().len(), 1);
    let drawn = drawn.borrow();
    let [DrawingBounds::Point(point)] = drawn.as_slice() else {
        panic!("expected one point, got {drawn:?}");
    };
    assert_relative_eq!(point.longitude, -97.5, epsilon = 1e-9);
    assert_relative_eq!(point.latitude, 35.5, epsilon = 1e-9);
}

#[test]
fn drawings_added_while_reporting_are_not_reported_again() {
    init_logging();
    let drawings: Rc<RefCell<Option<Handle<VectorSource>>>> = Rc::default();
    let calls = Rc::new(Cell::new(0));

    let slot = Rc::clone(&drawings);
    let counter = Rc::clone(&calls);
    let mut view = SearchMapView::new(props().on_drawing_added(move |_| {
        counter.set(counter.get() + 1);
        if let Some(source) = slot.borrow().as_ref() {
            let echo = Feature::new(Geometry::Point(Coordinate::default())).into_ref();
            source.add_feature(echo);
        }
    }));
    view.mount().unwrap();
    *drawings.borrow_mut() = view.drawings();
    view.select_draw_mode(Some(DrawTool::Point));

    let map = view.map().unwrap();
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::Click, Coordinate::default()));

    assert_eq!(calls.get(), 1);
    assert_eq!(view.drawings().unwrap().borrow().len(), 2);

    // the guard is released once the report returns
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::Click, Coordinate::default()));
    assert_eq!(calls.get(), 2);
}

#[test]
fn single_click_opens_the_facet_popup() {
    init_logging();
    let mut view = SearchMapView::new(props());
    view.mount().unwrap();
    let map = view.map().unwrap();

    let texas = from_lon_lat(Coordinate::new(-98.0, 32.0));
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::SingleClick, texas));

    let overlay = view.overlay().unwrap();
    assert_eq!(overlay.borrow().position(), Some(texas));
    let html = view.popup_content().content();
    assert!(html.contains("&nbsp;Texas</strong>"));
    assert!(html.contains("<li>count: 12</li>"));
    assert!(!html.contains("<li>layer:"));

    view.close_popup();
    assert_eq!(overlay.borrow().position(), None);

    let ocean = from_lon_lat(Coordinate::new(-150.0, 0.0));
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::SingleClick, ocean));
    assert_eq!(overlay.borrow().position(), None);
}

#[test]
fn context_menu_resets_the_map() {
    init_logging();
    let resets = Rc::new(Cell::new(0));
    let counter = Rc::clone(&resets);
    let mut view = SearchMapView::new(
        props()
            .with_lon_lat([-90.0, 30.0])
            .on_reset_map(move || counter.set(counter.get() + 1)),
    );
    view.mount().unwrap();
    view.select_draw_mode(Some(DrawTool::Point));
    let map = view.map().unwrap();
    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::Click, Coordinate::default()));
    assert_eq!(view.drawings().unwrap().borrow().len(), 1);

    map.dispatch(&MapBrowserEvent::new(BrowserEventKind::ContextMenu, Coordinate::default()));

    assert_eq!(resets.get(), 1);
    assert!(view.drawings().unwrap().borrow().is_empty());
    assert!(view.interaction().is_none());
    assert!(map.borrow().interactions().is_empty());
    let center = to_lon_lat(map.borrow().view().center());
    assert_relative_eq!(center.x, -90.0, epsilon = 1e-9);
    assert_relative_eq!(center.y, 30.0, epsilon = 1e-9);
    assert_eq!(map.borrow().view().zoom(), 4.0);
}

#[test]
fn geographic_tile_server_reprojects_the_map() {
    init_logging();
    let mut view = SearchMapView::new(props());
    view.mount().unwrap();
    let map = view.map().unwrap();
    let before = to_lon_lat(map.borrow().view().center());

    view.select_tile_server("arcgis-2d").unwrap();

    assert_eq!(view.map_projection(), Projection::Epsg4326);
    assert_eq!(map.borrow().view().projection(), Projection::Epsg4326);
    let after = map.borrow().view().center();
    assert_relative_eq!(after.x, before.x, epsilon = 1e-6);
    assert_relative_eq!(after.y, before.y, epsilon = 1e-6);

    // facet features are rebuilt in degrees
    let source = view.layers()[0].borrow().vector_source();
    let extent = source.borrow().extent().unwrap();
    assert!(extent.min.x >= -100.0 && extent.max.x <= -96.0);

    // same projection: only the tiles change
    view.select_tile_server("arcgis-2d").unwrap();
    assert_eq!(view.layers().len(), 3);
}

#[test]
fn hiding_the_map_hides_its_anchor() {
    init_logging();
    let mut view = SearchMapView::new(props().with_size("50%", "300px"));
    view.mount().unwrap();
    assert_eq!(view.anchor().style("height").as_deref(), Some("300px"));

    assert!(!view.toggle_show_map());
    assert_eq!(view.anchor().style("display").as_deref(), Some("none"));
    assert!(!view.anchor().is_visible());
    assert!(view.toggle_show_map());
    assert_eq!(view.anchor().style("display").as_deref(), Some("block"));
}
