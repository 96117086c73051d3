use geodraw::geometry::validation::ValidationResult;
use geodraw::geometry::{properties, Properties};
use geodraw::store::{ChangeKind, GeometryUpdate, PropertyUpdate, StoreChange, StoreOptions};
use geodraw::{
    Feature, FeatureId, FeatureStore, Geometry, NewFeature, SequentialIdStrategy, SpatialIndexError, StoreError,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

fn sequential_store() -> FeatureStore {
    FeatureStore::new(StoreOptions {
        tracked: true,
        id_strategy: Box::new(SequentialIdStrategy::new()),
    })
}

fn point(lng: f64, lat: f64) -> NewFeature {
    NewFeature::with_mode(Geometry::Point([lng, lat]), "point")
}

/// Records every notification the store emits
fn record_changes(store: &mut FeatureStore) -> Rc<RefCell<Vec<StoreChange>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    store.register_on_change(move |change, _| sink.borrow_mut().push(change.clone()));
    changes
}

#[test]
fn test_create_assigns_ids_and_timestamps() {
    let mut store = sequential_store();
    let ids = store.create(vec![point(0.0, 0.0), point(1.0, 1.0)], None).unwrap();

    assert_eq!(ids, vec![FeatureId::Number(1), FeatureId::Number(2)]);
    assert_eq!(store.size(), 2);

    let props = store.get_properties_copy(&ids[0]).unwrap();
    assert_eq!(props.get(properties::MODE), Some(&json!("point")));
    assert!(props.get(properties::CREATED_AT).is_some());
    assert!(props.get(properties::UPDATED_AT).is_some());
}

#[test]
fn test_untracked_store_leaves_properties_alone() {
    let mut store = FeatureStore::new(StoreOptions {
        tracked: false,
        ..Default::default()
    });
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();

    let props = store.get_properties_copy(&ids[0]).unwrap();
    assert!(props.get(properties::CREATED_AT).is_none());
    assert!(props.get(properties::UPDATED_AT).is_none());
}

#[test]
fn test_one_notification_per_call() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);

    let ids = store
        .create(vec![point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)], Some(json!({"origin": "test"})))
        .unwrap();
    store
        .update_property(
            ids.iter()
                .map(|id| PropertyUpdate::new(id.clone(), "color", "red"))
                .collect(),
            None,
        )
        .unwrap();
    store.delete(&ids[..2], None).unwrap();

    let changes = changes.borrow();
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0].kind, ChangeKind::Create);
    assert_eq!(changes[0].ids, ids);
    assert_eq!(changes[0].context, Some(json!({"origin": "test"})));
    assert_eq!(changes[1].kind, ChangeKind::Update);
    assert_eq!(changes[2].kind, ChangeKind::Delete);
    assert_eq!(changes[2].ids, ids[..2].to_vec());
}

#[test]
fn test_delete_then_lookup_fails() {
    let mut store = sequential_store();
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();
    store.delete(&ids, None).unwrap();

    assert!(!store.has(&ids[0]));
    assert_eq!(
        store.get_geometry_copy(&ids[0]),
        Err(StoreError::FeatureNotFound(ids[0].clone()))
    );
}

#[test]
fn test_failed_update_changes_nothing() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();

    let missing = FeatureId::Number(99);
    let result = store.update_geometry(
        vec![
            GeometryUpdate::new(ids[0].clone(), Geometry::Point([5.0, 5.0])),
            GeometryUpdate::new(missing.clone(), Geometry::Point([6.0, 6.0])),
        ],
        None,
    );

    assert_eq!(result, Err(StoreError::FeatureNotFound(missing)));
    assert_eq!(store.get_geometry_copy(&ids[0]).unwrap(), Geometry::Point([0.0, 0.0]));
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn test_copies_are_isolated_from_the_store() {
    let mut store = sequential_store();
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();

    let mut copy = store.copy(&ids[0]).unwrap();
    copy.geometry = Geometry::Point([9.0, 9.0]);
    copy.properties.insert("mutated".to_string(), json!(true));

    let stored = store.copy(&ids[0]).unwrap();
    assert_eq!(stored.geometry, Geometry::Point([0.0, 0.0]));
    assert!(stored.properties.get("mutated").is_none());
}

#[test]
fn test_update_property_refreshes_updated_at() {
    let mut store = sequential_store();
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();
    store
        .update_property(vec![PropertyUpdate::new(ids[0].clone(), properties::UPDATED_AT, 0)], None)
        .unwrap();
    assert_eq!(
        store.get_properties_copy(&ids[0]).unwrap().get(properties::UPDATED_AT),
        Some(&json!(0))
    );

    store
        .update_property(vec![PropertyUpdate::new(ids[0].clone(), "label", "a")], None)
        .unwrap();
    let props = store.get_properties_copy(&ids[0]).unwrap();
    assert_ne!(props.get(properties::UPDATED_AT), Some(&json!(0)));

    store
        .update_property(vec![PropertyUpdate::remove(ids[0].clone(), "label")], None)
        .unwrap();
    assert!(store.get_properties_copy(&ids[0]).unwrap().get("label").is_none());
}

#[test]
fn test_search_returns_features_near_area() {
    let mut store = sequential_store();
    let ids = store
        .create(vec![point(0.0, 0.0), point(10.0, 10.0)], None)
        .unwrap();

    let found = store
        .search(&Geometry::bbox_polygon([-1.0, -1.0], [1.0, 1.0]), None)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(ids[0].clone()));

    let filter: &dyn Fn(&Feature) -> bool = &|feature: &Feature| feature.mode() == Some("polygon");
    let filtered = store
        .search(&Geometry::bbox_polygon([-1.0, -1.0], [1.0, 1.0]), Some(filter))
        .unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn test_load_rejects_invalid_features_individually() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);

    let mut stale = Properties::new();
    stale.insert(properties::MODE.to_string(), json!("point"));
    stale.insert(properties::CREATED_AT.to_string(), json!("yesterday"));

    let features = vec![
        Feature::new(Some(FeatureId::Number(10)), Geometry::Point([0.0, 0.0]), Properties::new()),
        Feature::new(Some(FeatureId::Number(11)), Geometry::Point([200.0, 0.0]), Properties::new()),
        Feature::new(Some(FeatureId::Number(12)), Geometry::Point([1.0, 1.0]), stale),
    ];
    let validate: &dyn Fn(&Feature) -> ValidationResult = &|feature: &Feature| match &feature.geometry {
        Geometry::Point([lng, _]) if lng.abs() > 180.0 => ValidationResult::invalid("out of range"),
        _ => ValidationResult::valid(),
    };

    let results = store.load(features, Some(validate), None, None).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].valid);
    assert!(!results[1].valid);
    assert_eq!(results[1].reason.as_deref(), Some("out of range"));
    assert!(!results[2].valid);

    assert_eq!(store.size(), 1);
    assert!(store.has(&FeatureId::Number(10)));
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn test_load_aborts_on_duplicate_id() {
    let mut store = sequential_store();
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();

    let features = vec![
        Feature::new(Some(FeatureId::Number(50)), Geometry::Point([1.0, 1.0]), Properties::new()),
        Feature::new(Some(ids[0].clone()), Geometry::Point([2.0, 2.0]), Properties::new()),
    ];
    let result = store.load(features, None, None, None);

    assert_eq!(result, Err(StoreError::DuplicateId(ids[0].clone())));
    assert_eq!(store.size(), 1);
    assert!(!store.has(&FeatureId::Number(50)));
}

#[test]
fn test_load_assigns_missing_ids_and_calls_back() {
    let mut store = sequential_store();
    let mut added = Vec::new();
    let after_add: &mut dyn FnMut(&Feature) = &mut |feature: &Feature| added.push(feature.id.clone());

    let features = vec![Feature::new(None, Geometry::Point([0.0, 0.0]), Properties::new())];
    let results = store.load(features, None, Some(after_add), None).unwrap();

    assert!(results[0].valid);
    assert!(store.has(&results[0].id));
    assert_eq!(added, vec![Some(results[0].id.clone())]);
}

#[test]
fn test_clear_emits_single_delete() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);
    store.create(vec![point(0.0, 0.0), point(1.0, 1.0)], None).unwrap();

    store.clear();

    assert_eq!(store.size(), 0);
    let changes = changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].kind, ChangeKind::Delete);
    assert_eq!(changes[1].ids.len(), 2);
}

#[test]
fn test_restyle_notifies_without_changing() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);
    let ids = store.create(vec![point(0.0, 0.0)], None).unwrap();
    let before = store.copy(&ids[0]).unwrap();

    store.restyle(&ids, None).unwrap();

    assert_eq!(store.copy(&ids[0]).unwrap(), before);
    assert_eq!(changes.borrow()[1].kind, ChangeKind::Styling);
    assert!(store.restyle(&[FeatureId::Number(77)], None).is_err());
}

#[test]
fn test_copy_all_where_filters_on_properties() {
    let mut store = sequential_store();
    store
        .create(
            vec![
                point(0.0, 0.0),
                NewFeature::with_mode(Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]), "linestring"),
            ],
            None,
        )
        .unwrap();

    let lines = store.copy_all_where(|props| props.get(properties::MODE) == Some(&json!("linestring")));
    assert_eq!(lines.len(), 1);
    assert_eq!(store.copy_all().len(), 2);
}

fn search_ids(store: &FeatureStore, min: [f64; 2], max: [f64; 2]) -> HashSet<FeatureId> {
    store
        .search(&Geometry::bbox_polygon(min, max), None)
        .unwrap()
        .into_iter()
        .filter_map(|feature| feature.id)
        .collect()
}

#[test]
fn test_search_follows_moves_and_deletes() {
    let mut store = sequential_store();
    let ids = store
        .create((0..20).map(|i| point(i as f64 * 10.0, 0.0)).collect(), None)
        .unwrap();

    // every third point moves north, every fourth (from the second) is deleted
    let moves = ids
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 == 0)
        .map(|(i, id)| GeometryUpdate::new(id.clone(), Geometry::Point([i as f64 * 10.0, 50.0])))
        .collect();
    store.update_geometry(moves, None).unwrap();
    let deleted: Vec<FeatureId> = ids
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 == 1)
        .map(|(_, id)| id.clone())
        .collect();
    store.delete(&deleted, None).unwrap();

    let expected = |keep: fn(usize) -> bool| -> HashSet<FeatureId> {
        ids.iter()
            .enumerate()
            .filter(|(i, _)| i % 4 != 1 && keep(*i))
            .map(|(_, id)| id.clone())
            .collect()
    };

    assert_eq!(search_ids(&store, [-5.0, -5.0], [195.0, 5.0]), expected(|i| i % 3 != 0));
    assert_eq!(search_ids(&store, [-5.0, 45.0], [195.0, 55.0]), expected(|i| i % 3 == 0));

    let everything = search_ids(&store, [-10.0, -10.0], [200.0, 60.0]);
    assert_eq!(everything.len(), store.size());
    for id in &deleted {
        assert!(!everything.contains(id));
    }
}

#[test]
fn test_delete_with_repeated_id_deletes_once() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);
    let ids = store.create(vec![point(0.0, 0.0), point(1.0, 1.0)], None).unwrap();

    store
        .delete(&[ids[0].clone(), ids[0].clone()], None)
        .unwrap();

    assert!(!store.has(&ids[0]));
    assert_eq!(store.size(), 1);
    assert!(search_ids(&store, [-1.0, -1.0], [2.0, 2.0]).contains(&ids[1]));

    let changes = changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].kind, ChangeKind::Delete);
    assert_eq!(changes[1].ids, vec![ids[0].clone()]);
}

#[test]
fn test_unboxable_geometry_fails_batch_before_mutation() {
    let mut store = sequential_store();
    let changes = record_changes(&mut store);
    let no_rings = Geometry::Polygon(Vec::new());

    let result = store.create(
        vec![point(0.0, 0.0), NewFeature::with_mode(no_rings.clone(), "polygon")],
        None,
    );
    assert_eq!(
        result,
        Err(StoreError::SpatialIndex(SpatialIndexError::UnsupportedGeometry("Polygon")))
    );
    assert_eq!(store.size(), 0);
    assert!(changes.borrow().is_empty());

    let ids = store.create(vec![point(0.0, 0.0), point(1.0, 1.0)], None).unwrap();
    let result = store.update_geometry(
        vec![
            GeometryUpdate::new(ids[0].clone(), Geometry::Point([5.0, 5.0])),
            GeometryUpdate::new(ids[1].clone(), no_rings),
        ],
        None,
    );
    assert!(result.is_err());
    assert_eq!(store.get_geometry_copy(&ids[0]).unwrap(), Geometry::Point([0.0, 0.0]));
    assert!(search_ids(&store, [4.0, 4.0], [6.0, 6.0]).is_empty());
    assert_eq!(changes.borrow().len(), 1);
}
