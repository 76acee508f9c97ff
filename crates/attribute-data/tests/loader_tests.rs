//! Paging, merge and notification behaviour of the attribute loader.

use std::sync::Arc;

use attribute_data::{AttributeLoader, DatasetStore, LoadError, INITIAL_MAX_ID};
use map_common::{AttributeEvent, EventBus, LayerId, LayerKind, MapError};
use test_utils::{
    drain_events, id_rows, metadata_without_oid, named_row, oid_metadata,
    ScriptedFeatureService, OID,
};

const URL: &str = "https://services.test/arcgis/rest/services/Sites/FeatureServer/0";

fn loader(service: &Arc<ScriptedFeatureService>) -> AttributeLoader {
    AttributeLoader::new(service.clone(), DatasetStore::new(), EventBus::default())
}

#[tokio::test]
async fn test_short_last_page_ends_paging() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None))
            .with_page(id_rows(1, 3))
            .with_page(id_rows(4, 3))
            .with_page(id_rows(7, 1)),
    );
    let loader = loader(&service);

    let layer = LayerId::new("sites");
    let records = loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap();

    assert_eq!(records, 7);
    assert_eq!(service.page_requests(), 3);
    assert_eq!(service.cursors(), vec![INITIAL_MAX_ID, 3, 6]);
    assert_eq!(loader.store().get(&layer).await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_exact_multiple_needs_one_empty_page() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None))
            .with_pages([id_rows(1, 2), id_rows(3, 2), id_rows(5, 2)]),
    );
    let loader = loader(&service);

    let layer = LayerId::new("sites");
    let records = loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap();

    assert_eq!(records, 6);
    assert_eq!(service.page_requests(), 4);
    assert_eq!(service.cursors(), vec![INITIAL_MAX_ID, 2, 4, 6]);

    let dataset = loader.store().get(&layer).await.unwrap();
    assert!(dataset.get("5").is_some());
    assert!(dataset.get("6").is_some());
}

#[tokio::test]
async fn test_declared_page_size_wins_over_first_page() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(Some(5)))
            .with_page(id_rows(1, 3))
            .with_page(id_rows(4, 3)),
    );
    let loader = loader(&service);

    let records = loader
        .load_attribute_data(&LayerId::new("sites"), URL, LayerKind::Feature)
        .await
        .unwrap();

    assert_eq!(records, 3);
    assert_eq!(service.page_requests(), 1);
}

#[tokio::test]
async fn test_empty_layer_loads_empty_dataset() {
    let service = Arc::new(ScriptedFeatureService::new(oid_metadata(None)));
    let loader = loader(&service);
    let mut rx = loader.events().subscribe();

    let layer = LayerId::new("empty");
    let records = loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap();

    assert_eq!(records, 0);
    assert_eq!(service.page_requests(), 1);
    assert!(loader.store().get(&layer).await.unwrap().is_empty());
    assert_eq!(
        drain_events(&mut rx),
        vec![AttributeEvent::DataChanged { layer, records: 0 }]
    );
}

#[tokio::test]
async fn test_index_matches_positions_after_load() {
    let pages = (0..4).map(|p| id_rows(p * 10 + 1, 10));
    let service = Arc::new(ScriptedFeatureService::new(oid_metadata(None)).with_pages(pages));
    let loader = loader(&service);

    let layer = LayerId::new("sites");
    loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap();

    let dataset = loader.store().get(&layer).await.unwrap();
    assert_eq!(dataset.len(), 40);
    assert!(dataset.index_is_consistent());
    for (i, record) in dataset.features().iter().enumerate() {
        let key = record.attribute(OID).unwrap().key_string();
        assert_eq!(dataset.position(&key), Some(i));
        assert_eq!(record.layer(), &layer);
    }
    assert_eq!(service.cursors(), vec![INITIAL_MAX_ID, 10, 20, 30, 40]);
}

#[tokio::test]
async fn test_failed_page_discards_accumulation() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None))
            .with_page(id_rows(1, 2))
            .with_failure(MapError::Service {
                code: 500,
                message: "Unable to complete operation.".to_string(),
                details: vec![],
            }),
    );
    let loader = loader(&service);
    let mut rx = loader.events().subscribe();

    let layer = LayerId::new("sites");
    let err = loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::Service(MapError::Service { code: 500, .. })));
    assert!(!loader.store().contains(&layer).await);

    let events = drain_events(&mut rx);
    assert_eq!(events.len(), 1);
    match &events[0] {
        AttributeEvent::LoadFailed { layer: failed, reason } => {
            assert_eq!(failed, &layer);
            assert!(reason.contains("Unable to complete operation"));
        }
        other => panic!("expected LoadFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_data() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None)).with_failure(MapError::Timeout),
    );
    let loader = loader(&service);

    let layer = LayerId::new("sites");
    loader
        .extract_attribute_data(&layer, Some(OID.to_string()), vec![named_row(1, "Alpha")])
        .await;

    assert!(loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .is_err());

    let dataset = loader.store().get(&layer).await.unwrap();
    assert_eq!(dataset.len(), 1);
}

#[tokio::test]
async fn test_metadata_failure_publishes_load_failed() {
    let service = Arc::new(ScriptedFeatureService::failing_metadata(MapError::HttpStatus {
        url: URL.to_string(),
        status: 503,
    }));
    let loader = loader(&service);
    let mut rx = loader.events().subscribe();

    let err = loader
        .load_attribute_data(&LayerId::new("sites"), URL, LayerKind::Feature)
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::Service(MapError::HttpStatus { status: 503, .. })));
    assert_eq!(service.page_requests(), 0);
    assert!(matches!(
        drain_events(&mut rx).as_slice(),
        [AttributeEvent::LoadFailed { .. }]
    ));
}

#[tokio::test]
async fn test_missing_id_field_fails_without_paging() {
    let service = Arc::new(ScriptedFeatureService::new(metadata_without_oid()));
    let loader = loader(&service);
    let mut rx = loader.events().subscribe();

    let layer = LayerId::new("no-oid");
    let err = loader
        .load_attribute_data(&layer, URL, LayerKind::Feature)
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::MissingIdField(ref l) if l == &layer));
    assert_eq!(service.page_requests(), 0);
    assert!(matches!(
        drain_events(&mut rx).as_slice(),
        [AttributeEvent::LoadFailed { .. }]
    ));
}

#[tokio::test]
async fn test_cursor_must_advance() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None))
            .with_page(id_rows(5, 3))
            .with_page(id_rows(1, 3)),
    );
    let loader = loader(&service);

    let err = loader
        .load_attribute_data(&LayerId::new("sites"), URL, LayerKind::Feature)
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::CursorStalled { cursor: 7, .. }));
}

#[tokio::test]
async fn test_sublayer_url() {
    let service = Arc::new(ScriptedFeatureService::new(oid_metadata(None)));
    let loader = loader(&service);

    loader
        .load_attribute_data(
            &LayerId::new("parcels"),
            "https://services.test/arcgis/rest/services/Cadastre/MapServer/",
            LayerKind::MapServiceSublayer { index: 2 },
        )
        .await
        .unwrap();

    let urls = service.urls();
    assert!(!urls.is_empty());
    assert!(urls
        .iter()
        .all(|u| u == "https://services.test/arcgis/rest/services/Cadastre/MapServer/2"));
}

#[tokio::test]
async fn test_reload_replaces_dataset() {
    let service = Arc::new(
        ScriptedFeatureService::new(oid_metadata(None))
            .with_page(id_rows(1, 2))
            .with_page(Vec::new())
            .with_page(id_rows(10, 1)),
    );
    let loader = loader(&service);
    let layer = LayerId::new("sites");

    assert_eq!(
        loader
            .load_attribute_data(&layer, URL, LayerKind::Feature)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        loader
            .load_attribute_data(&layer, URL, LayerKind::Feature)
            .await
            .unwrap(),
        1
    );

    let dataset = loader.store().get(&layer).await.unwrap();
    assert_eq!(dataset.len(), 1);
    assert!(dataset.get("1").is_none());
    assert!(dataset.get("10").is_some());
}

#[tokio::test]
async fn test_extract_publishes_data_changed() {
    let service = Arc::new(ScriptedFeatureService::new(oid_metadata(None)));
    let loader = loader(&service);
    let mut rx = loader.events().subscribe();

    let layer = LayerId::new("local");
    let records = loader
        .extract_attribute_data(&layer, Some(OID.to_string()), id_rows(1, 4))
        .await;

    assert_eq!(records, 4);
    assert_eq!(service.page_requests(), 0);
    assert_eq!(
        drain_events(&mut rx),
        vec![AttributeEvent::DataChanged { layer, records: 4 }]
    );
}
