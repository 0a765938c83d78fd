use owmap::data::region::{SubregionArea, SubregionCatalog};
use owmap::layers::base::LayerId;
use owmap::layers::marker::{Container, VisualClass};
use owmap::store::view_state::{MemoryViewStates, ViewState};
use owmap::tiles::loader::MemoryTileFetcher;
use owmap::{
    LatLng, MapBuilder, MapCore, MapError, MapEvent, MapOptions, MapState, ManualClock, MarkerRecord,
    MarkerType, MarkerTypeCatalog, Point, RegionCatalog,
};
use std::sync::Arc;

const REGIONS: &str = r#"{
    "Valley_4": {
        "dimensions": [8000, 10000],
        "tileSize": 200,
        "maxZoom": 3,
        "initialOffset": { "x": 750, "y": 250 },
        "initialZoom": 2,
        "subregions": ["Valley_4"]
    },
    "Wuling": {
        "dimensions": [6000, 6000],
        "tileSize": 200,
        "maxZoom": 3,
        "initialOffset": { "x": 0, "y": 0 },
        "initialZoom": 1,
        "subregions": ["Wuling_1", "Wuling_2"]
    }
}"#;

fn catalog() -> Arc<MarkerTypeCatalog> {
    let mut catalog = MarkerTypeCatalog::new();
    catalog.insert(MarkerType::new("chest", "collection", "chest"));
    catalog.insert(MarkerType::new("ore", "resource", "mineral"));
    catalog.insert(MarkerType::new("boss", "enemy", "elite").with_no_frame());
    Arc::new(catalog)
}

fn areas() -> Arc<SubregionCatalog> {
    let mut areas = SubregionCatalog::new();
    areas.extend([SubregionArea {
        id: "Valley_4".to_string(),
        name: "Valley IV".to_string(),
        bounds: vec![[1000.0, 1000.0], [7000.0, 9000.0]],
        polygon: Vec::new(),
    }]);
    Arc::new(areas)
}

fn build(clock: &ManualClock) -> (MapCore, Arc<MemoryTileFetcher>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let fetcher = Arc::new(MemoryTileFetcher::new());
    let map = MapBuilder::new()
        .with_regions(RegionCatalog::from_json_str(REGIONS).unwrap())
        .with_marker_types(catalog())
        .with_subregions(areas())
        .with_tile_fetcher(fetcher.clone())
        .with_view_states(Box::new(MemoryViewStates::new()))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    (map, fetcher)
}

fn ore_markers() -> Vec<MarkerRecord> {
    (0..5)
        .map(|i| MarkerRecord::new(format!("ore{i}"), [-600.0 - i as f64, 500.0 + i as f64], "Valley_4", "ore"))
        .collect()
}

#[tokio::test]
async fn test_switch_region_sets_camera_bounds_and_tiles() {
    let clock = ManualClock::new();
    let (mut map, fetcher) = build(&clock);

    map.switch_region("Valley_4").await.unwrap();

    assert_eq!(map.state(), &MapState::Ready);
    assert_eq!(map.viewport().center, LatLng::new(-656.25, 593.75));
    assert_eq!(map.viewport().zoom, 2.0);
    assert_eq!(map.viewport().max_zoom, 4.0);

    let bounds = map.viewport().max_bounds().unwrap();
    assert_eq!(bounds.south_west, LatLng::new(-1250.0, 0.0));
    assert_eq!(bounds.north_east, LatLng::new(0.0, 1000.0));

    assert!(map.layers().is_attached(&LayerId::BaseTiles));
    assert!(map.layers().is_attached(&LayerId::SubregionGroup("Valley_4".to_string())));
    let base = map.base_tiles().unwrap();
    assert!(base.is_loaded());
    assert!(base.tile_count() > 0);
    assert!(fetcher.requests().iter().all(|url| url.starts_with("/clips/Valley_4/2/")));

    let events = map.process_events();
    assert_eq!(
        events,
        vec![MapEvent::RegionSwitched {
            region: "Valley_4".to_string()
        }]
    );
}

#[tokio::test]
async fn test_unknown_region_is_fatal_and_leaves_map_untouched() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    let result = map.switch_region("Nowhere").await;
    assert!(matches!(result, Err(MapError::RegionNotFound(_))));
    assert_eq!(map.current_region_key(), Some("Valley_4"));
    assert_eq!(map.state(), &MapState::Ready);
}

#[tokio::test]
async fn test_min_zoom_above_region_max_is_rejected() {
    let clock = ManualClock::new();
    let mut map = MapBuilder::new()
        .with_options(MapOptions {
            min_zoom: 6.0,
            ..MapOptions::default()
        })
        .with_regions(RegionCatalog::from_json_str(REGIONS).unwrap())
        .with_marker_types(catalog())
        .with_tile_fetcher(Arc::new(MemoryTileFetcher::new()))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let result = map.switch_region("Valley_4").await;
    assert!(matches!(result, Err(MapError::InvalidOptions(_))));
    assert_eq!(map.state(), &MapState::Ready);
    assert_eq!(map.current_region_key(), None);
    assert!(map.layers().is_empty());
}

#[tokio::test]
async fn test_zoom_and_pan_are_clamped() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    map.zoom_to(10.0, None);
    assert_eq!(map.viewport().zoom, 4.0);
    map.zoom_to(-3.0, None);
    assert_eq!(map.viewport().zoom, 0.0);
    map.zoom_to(1.3, None);
    assert_eq!(map.viewport().zoom, 1.25);

    map.pan_by(Point::new(1.0e7, 1.0e7));
    let center = map.viewport().center;
    let bounds = map.viewport().max_bounds().unwrap();
    assert!(bounds.contains(&center));
    assert_eq!(center, LatLng::new(-1250.0, 1000.0));
}

#[tokio::test]
async fn test_view_state_round_trip_between_regions() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    map.zoom_to(3.0, None);
    map.pan_by(Point::new(120.0, -40.0));
    let saved_center = map.viewport().center;
    let saved_zoom = map.viewport().zoom;

    map.switch_region("Wuling").await.unwrap();
    assert_eq!(map.viewport().zoom, 1.0);
    assert!(!map.layers().is_attached(&LayerId::SubregionGroup("Valley_4".to_string())));
    assert!(map.layers().is_attached(&LayerId::SubregionGroup("Wuling_2".to_string())));

    map.switch_region("Valley_4").await.unwrap();
    assert_eq!(map.viewport().center, saved_center);
    assert_eq!(map.viewport().zoom, saved_zoom);
}

#[tokio::test]
async fn test_programmatic_move_does_not_save_view() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    assert!(map.set_map_view(ViewState::new(LatLng::new(-300.0, 300.0), 1.0), false));
    assert!(!map.is_transforming());
    assert!(map.view_states().get_view_state("Valley_4").is_none());

    assert!(map.set_map_view(ViewState::new(LatLng::new(-900.0, 700.0), 3.0), true));
    assert!(!map.set_map_view(ViewState::new(LatLng::new(-100.0, 100.0), 0.0), true));

    clock.advance_ms(100);
    map.tick();
    assert!(map.is_transforming());

    clock.advance_ms(200);
    map.tick();
    assert!(!map.is_transforming());
    assert_eq!(map.viewport().center, LatLng::new(-900.0, 700.0));
    assert_eq!(map.viewport().zoom, 3.0);
    assert!(map.view_states().get_view_state("Valley_4").is_none());

    let events = map.process_events();
    assert!(events.contains(&MapEvent::ZoomEnd { zoom: 3.0 }));
}

#[tokio::test]
async fn test_hidden_marker_is_removed_after_fade() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.import_markers(vec![MarkerRecord::new("m1", [-650.0, 590.0], "Valley_4", "chest")]);

    map.filter_markers(["chest"]);
    assert!(map.marker_layer().is_rendered("m1", map.layers()));

    map.filter_markers(Vec::<String>::new());
    let handle = map.marker_layer().handle("m1").unwrap();
    assert!(handle.has_class(VisualClass::FadeOut));
    assert!(map.marker_layer().is_rendered("m1", map.layers()));

    clock.advance_ms(159);
    map.tick();
    assert!(map.marker_layer().is_rendered("m1", map.layers()));

    clock.advance_ms(1);
    map.tick();
    assert!(!map.marker_layer().is_rendered("m1", map.layers()));
    assert!(!map.marker_layer().handle("m1").unwrap().has_class(VisualClass::FadeOut));
}

#[tokio::test]
async fn test_showing_again_cancels_pending_removal() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.import_markers(vec![MarkerRecord::new("m1", [-650.0, 590.0], "Valley_4", "chest")]);
    map.filter_markers(["chest"]);

    map.filter_markers(Vec::<String>::new());
    clock.advance_ms(100);
    map.filter_markers(["chest"]);
    assert!(!map.marker_layer().handle("m1").unwrap().has_class(VisualClass::FadeOut));

    clock.advance_ms(100);
    map.tick();
    assert!(map.marker_layer().is_rendered("m1", map.layers()));
    assert_eq!(map.marker_layer().pending_removals(), 0);
}

#[tokio::test]
async fn test_import_is_idempotent_and_skips_unknown_types() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    let records = vec![
        MarkerRecord::new("m1", [-650.0, 590.0], "Valley_4", "chest"),
        MarkerRecord::new("m2", [-640.0, 580.0], "Valley_4", "unknown_type"),
    ];
    assert_eq!(map.import_markers(records.clone()), 1);
    assert_eq!(map.import_markers(records), 0);

    let registry = map.marker_layer().registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.ids_of_type("chest"), ["m1".to_string()]);
    assert!(registry.record("m1").is_some());
    assert!(!registry.contains("m2"));
}

#[tokio::test]
async fn test_ore_markers_form_one_cluster() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.import_markers(ore_markers());
    map.enable_marker_clustering();
    map.filter_markers(["ore"]);

    let cluster_layer = LayerId::ClusterGroup("ore".to_string());
    assert!(map.layers().is_attached(&cluster_layer));

    let markers = map.marker_layer();
    assert_eq!(markers.cluster().child_count("ore", markers.registry()), 5);
    assert_eq!(markers.registry().member_count(&Container::Cluster("ore".to_string())), 5);
    assert_eq!(markers.registry().member_count(&Container::Subregion("Valley_4".to_string())), 0);
    assert!(markers.rendered_plain_ids(map.layers()).is_empty());
    assert_eq!(markers.visible_marker_count(), 0);

    let icon = markers.cluster().group_icon("ore", markers.registry()).unwrap();
    assert_eq!(icon.count, 5);
}

#[tokio::test]
async fn test_toggling_clustering_moves_markers_between_containers() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.import_markers(ore_markers());
    map.filter_markers(["ore"]);
    assert_eq!(map.marker_layer().rendered_plain_ids(map.layers()).len(), 5);

    map.enable_marker_clustering();
    for handle in map.marker_layer().registry().handles() {
        assert_eq!(handle.parent(), Some(&Container::Cluster("ore".to_string())));
    }

    map.disable_marker_clustering();
    assert!(!map.layers().is_attached(&LayerId::ClusterGroup("ore".to_string())));
    for handle in map.marker_layer().registry().handles() {
        assert_eq!(handle.parent(), Some(&Container::Subregion("Valley_4".to_string())));
    }
}

#[tokio::test]
async fn test_collected_markers_hide_when_completed_are_hidden() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.import_markers(vec![
        MarkerRecord::new("m1", [-650.0, 590.0], "Valley_4", "chest"),
        MarkerRecord::new("m2", [-640.0, 580.0], "Valley_4", "chest"),
    ]);
    map.filter_markers(["chest"]);

    map.update_collected_points(["m1"]);
    assert!(map.marker_layer().handle("m1").unwrap().has_class(VisualClass::Checked));
    assert!(map.marker_layer().is_rendered("m1", map.layers()));

    map.set_hide_completed(true);
    clock.advance_ms(160);
    map.tick();
    assert!(!map.marker_layer().is_rendered("m1", map.layers()));
    assert!(map.marker_layer().is_rendered("m2", map.layers()));
}

#[tokio::test]
async fn test_secondary_layer_dims_base_tiles() {
    use owmap::layers::base::LayerTrait;

    let clock = ManualClock::new();
    let (mut map, fetcher) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    map.process_events();

    map.switch_layer("B1").await.unwrap();
    assert!(map.layers().is_attached(&LayerId::SecondaryTiles));
    assert_eq!(map.base_tiles().unwrap().opacity(), 0.4);
    assert!(fetcher.requests().iter().any(|url| url.starts_with("/clips/Valley_4_b1/")));
    assert_eq!(
        map.process_events(),
        vec![MapEvent::LayerSwitched {
            layer: "B1".to_string()
        }]
    );

    map.switch_layer("M").await.unwrap();
    assert!(!map.layers().is_attached(&LayerId::SecondaryTiles));
    assert_eq!(map.base_tiles().unwrap().opacity(), 1.0);
    assert!(map.switch_layer("Z7").await.is_err());
}

#[tokio::test]
async fn test_boundaries_and_highlight() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();

    map.show_subregion_boundaries();
    assert!(map.boundaries().is_visible());
    assert_eq!(map.subregion_at(&LatLng::new(-600.0, 500.0)).as_deref(), Some("Valley_4"));
    assert_eq!(map.subregion_at(&LatLng::new(-10.0, 10.0)), None);

    assert!(map.highlight_subregion("Valley_4"));
    let highlight = LayerId::Highlight("Valley_4".to_string());
    assert!(map.layers().is_attached(&highlight));
    clock.advance_ms(1500);
    map.tick();
    assert!(!map.layers().is_attached(&highlight));
}

#[tokio::test]
async fn test_region_switch_drops_highlight() {
    let clock = ManualClock::new();
    let (mut map, _) = build(&clock);
    map.switch_region("Valley_4").await.unwrap();
    assert!(map.highlight_subregion("Valley_4"));
    assert_eq!(map.boundaries().highlighted(), Some("Valley_4"));

    map.switch_region("Wuling").await.unwrap();
    assert_eq!(map.boundaries().highlighted(), None);
    assert!(!map.layers().is_attached(&LayerId::Highlight("Valley_4".to_string())));
}
