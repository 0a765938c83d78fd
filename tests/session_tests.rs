use owmap::data::label::{LabelData, LabelKind};
use owmap::data::region::{SubregionArea, SubregionCatalog};
use owmap::input::events::LassoEvent;
use owmap::layers::base::LayerId;
use owmap::layers::marker::VisualClass;
use owmap::store::{MemoryStorage, Storage};
use owmap::tiles::loader::MemoryTileFetcher;
use owmap::{
    LatLng, LatLngBounds, MapBuilder, MapSession, ManualClock, MarkerDataset, MarkerRecord,
    MarkerType, MarkerTypeCatalog, RegionCatalog,
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

const LABELS: &str = r#"{
    "version": 1,
    "regions": {
        "VL": {
            "labels": {
                "VL/HB": { "id": "VL/HB", "type": "sub", "region": "VL", "sub": "HB", "point": [4000, 5000] },
                "VL/HB/gate": { "id": "VL/HB/gate", "type": "site", "region": "VL", "sub": "HB", "site": "gate", "point": [4100, 5100] },
                "VL/HB/mine": { "id": "VL/HB/mine", "type": "site", "region": "VL", "sub": "HB", "site": "mine", "point": [4200, 5200] }
            }
        }
    }
}"#;

fn area(id: &str, bounds: [[f64; 2]; 2]) -> SubregionArea {
    SubregionArea {
        id: id.to_string(),
        name: id.to_string(),
        bounds: bounds.to_vec(),
        polygon: Vec::new(),
    }
}

fn dataset() -> MarkerDataset {
    let mut records = vec![MarkerRecord::new("m1", [-650.0, 590.0], "Valley_4", "chest")];
    records.extend(
        (0..5).map(|i| MarkerRecord::new(format!("ore{i}"), [-600.0, 500.0 + i as f64], "Valley_4", "ore")),
    );
    MarkerDataset::from_subregions([
        ("Valley_4".to_string(), records),
        (
            "Wuling_1".to_string(),
            vec![MarkerRecord::new("w1", [-300.0, 300.0], "Wuling_1", "chest")],
        ),
    ])
}

fn session(clock: &ManualClock, storage: Arc<dyn Storage>) -> MapSession {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut types = MarkerTypeCatalog::new();
    types.insert(MarkerType::new("chest", "collection", "chest"));
    types.insert(MarkerType::new("ore", "resource", "mineral"));

    let mut areas = SubregionCatalog::new();
    areas.extend([
        area("Valley_4", [[1000.0, 1000.0], [7000.0, 9000.0]]),
        area("Wuling_1", [[0.0, 0.0], [3000.0, 6000.0]]),
    ]);

    let core = MapBuilder::new()
        .with_regions(RegionCatalog::from_json_str(REGIONS).unwrap())
        .with_marker_types(Arc::new(types))
        .with_subregions(Arc::new(areas))
        .with_tile_fetcher(Arc::new(MemoryTileFetcher::new()))
        .with_storage(storage.clone())
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    MapSession::new(core, storage)
}

#[tokio::test]
async fn test_init_restores_persisted_state() {
    let clock = ManualClock::new();
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage.set("map-prefs", r#"{"clustering":true}"#).unwrap();
    storage.set("marker-filter", r#"{"filter":["ore","chest"]}"#).unwrap();
    storage.set("points-storage", r#"{"activePoints":["m1"]}"#).unwrap();

    let mut session = session(&clock, storage);
    session.init(&dataset()).await.unwrap();

    let core = session.core();
    assert_eq!(core.current_region_key(), Some("Valley_4"));
    assert!(core.layers().is_attached(&LayerId::ClusterGroup("ore".to_string())));
    let markers = core.marker_layer();
    assert_eq!(markers.registry().len(), 7);
    assert!(markers.handle("m1").unwrap().has_class(VisualClass::Checked));
    assert!(markers.is_rendered("m1", core.layers()));
    assert!(!markers.is_rendered("w1", core.layers()));
    assert_eq!(markers.rendered_plain_ids(core.layers()), vec!["m1".to_string()]);
}

#[tokio::test]
async fn test_unknown_saved_region_falls_back_to_default() {
    let clock = ManualClock::new();
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage.set("region-storage", r#"{"currentRegionKey":"Atlantis"}"#).unwrap();

    let mut session = session(&clock, storage);
    session.init(&dataset()).await.unwrap();

    assert_eq!(session.core().current_region_key(), Some("Valley_4"));
    assert_eq!(session.region_store().current_region(), "Valley_4");
}

#[tokio::test]
async fn test_labels_follow_region_and_zoom() {
    let clock = ManualClock::new();
    let mut session = session(&clock, Arc::new(MemoryStorage::new()));
    session.set_label_data(LabelData::try_parse(LABELS).unwrap());
    session.init(&dataset()).await.unwrap();

    assert_eq!(session.labels().shown_kind(), Some(LabelKind::Site));
    assert_eq!(session.labels().labels().len(), 2);

    session.core_mut().zoom_to(0.0, None);
    session.pump_events();
    assert!(session.labels().labels().iter().all(|label| label.fading));

    clock.advance_ms(200);
    session.tick();
    assert_eq!(session.labels().shown_kind(), Some(LabelKind::Sub));
    assert_eq!(session.labels().labels().len(), 1);

    session.set_label_tool_mounted(true);
    assert!(!session.core().layers().is_attached(&LayerId::Labels));
    session.set_label_tool_mounted(false);
    assert!(session.core().layers().is_attached(&LayerId::Labels));
}

#[tokio::test]
async fn test_subregion_request_centres_and_highlights() {
    let clock = ManualClock::new();
    let mut session = session(&clock, Arc::new(MemoryStorage::new()));
    session.init(&dataset()).await.unwrap();

    session.request_subregion_switch("Valley_4");
    assert!(session.process_subregion_request().await.unwrap());
    assert!(!session.process_subregion_request().await.unwrap());
    assert_eq!(session.region_store().current_subregion(), Some("Valley_4"));
    assert!(session.core().is_transforming());

    clock.advance_ms(250);
    session.tick();
    let core = session.core();
    assert_eq!(core.viewport().zoom, 1.0);
    assert_eq!(core.viewport().center, LatLng::new(-625.0, 500.0));
    assert_eq!(core.boundaries().highlighted(), Some("Valley_4"));
    assert!(!core.is_transforming());
}

#[tokio::test]
async fn test_subregion_request_switches_region() {
    let clock = ManualClock::new();
    let mut session = session(&clock, Arc::new(MemoryStorage::new()));
    session.init(&dataset()).await.unwrap();

    session.request_subregion_switch("Wuling_1");
    assert!(session.process_subregion_request().await.unwrap());
    assert_eq!(session.core().current_region_key(), Some("Wuling"));
    assert_eq!(session.region_store().current_region(), "Wuling");
    assert_eq!(session.region_store().current_subregion(), Some("Wuling_1"));

    session.request_subregion_switch("Nowhere_9");
    assert!(!session.process_subregion_request().await.unwrap());
    assert!(!session.region_store().has_switch_request());
}

#[tokio::test]
async fn test_filter_collection_and_save() {
    let clock = ManualClock::new();
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let mut session = session(&clock, storage.clone());
    session.init(&dataset()).await.unwrap();

    assert!(session.toggle_filter("chest"));
    assert!(session.core().marker_layer().is_rendered("m1", session.core().layers()));

    session.set_hide_completed(true);
    session.add_collected("m1");
    clock.advance_ms(160);
    session.tick();
    assert!(!session.core().marker_layer().is_rendered("m1", session.core().layers()));

    session.remove_collected("m1");
    assert!(session.core().marker_layer().is_rendered("m1", session.core().layers()));

    session.set_cluster_enabled(true);
    session.set_boundaries_visible(true);
    session.save().unwrap();

    assert!(storage.get("marker-filter").unwrap().unwrap().contains("chest"));
    assert!(storage.get("map-prefs").unwrap().unwrap().contains("\"clustering\":true"));
    assert!(storage.get("region-storage").unwrap().unwrap().contains("Valley_4"));
    assert!(storage.get("points-storage").unwrap().is_some());
}

#[tokio::test]
async fn test_boundaries_come_back_after_region_switch() {
    let clock = ManualClock::new();
    let mut session = session(&clock, Arc::new(MemoryStorage::new()));
    session.init(&dataset()).await.unwrap();
    session.set_boundaries_visible(true);
    assert!(session.core().boundaries().is_visible());

    session.set_region("Wuling").await.unwrap();
    assert!(session.core().boundaries().is_visible());
    assert_eq!(session.core().boundaries().active().unwrap().shapes.len(), 2);
}

#[tokio::test]
async fn test_lasso_selects_filtered_markers() {
    let clock = ManualClock::new();
    let mut session = session(&clock, Arc::new(MemoryStorage::new()));
    session.init(&dataset()).await.unwrap();
    session.set_filter(["chest"]);

    let bounds = LatLngBounds::from_coords(-700.0, 550.0, -600.0, 650.0);
    session.lasso(LassoEvent::Highlight {
        bounds: bounds.clone(),
        deselect: false,
    });
    assert!(session.core().marker_layer().handle("m1").unwrap().has_class(VisualClass::Selected));

    let selected = session.lasso(LassoEvent::Select {
        bounds,
        deselect: false,
    });
    assert_eq!(selected, vec!["m1".to_string()]);
    assert_eq!(session.marker_store().selected(), ["m1".to_string()]);
    assert!(session.core().marker_layer().handle("m1").unwrap().has_class(VisualClass::Selected));

    assert_eq!(session.toggle_selected("m1"), Some(false));
    assert!(session.marker_store().selected().is_empty());
}
