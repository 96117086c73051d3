use geodraw::{BBox, FeatureId, Geometry, SpatialIndex, SpatialIndexError};

fn unit_square(x: f64, y: f64) -> Geometry {
    Geometry::bbox_polygon([x, y], [x + 1.0, y + 1.0])
}

#[test]
fn test_point_found_by_overlapping_area_only() {
    let mut index = SpatialIndex::new();
    let id = FeatureId::from("a");
    index.insert(&id, &Geometry::Point([0.0, 0.0])).unwrap();

    let hit = index
        .search(&Geometry::bbox_polygon([-1.0, -1.0], [1.0, 1.0]))
        .unwrap();
    assert_eq!(hit, vec![id.clone()]);

    let miss = index
        .search(&Geometry::bbox_polygon([2.0, 2.0], [3.0, 3.0]))
        .unwrap();
    assert!(miss.is_empty());
}

#[test]
fn test_bulk_load_then_search_finds_exactly_one() {
    let mut index = SpatialIndex::new();
    let ids: Vec<FeatureId> = (0..1000).map(FeatureId::Number).collect();
    let geometries: Vec<Geometry> = (0..1000)
        .map(|i| unit_square((i % 40) as f64 * 3.0, (i / 40) as f64 * 3.0))
        .collect();
    index.load(ids.iter().zip(geometries.iter())).unwrap();
    assert_eq!(index.len(), 1000);

    // Shrink the query so neighbours three units away never touch it
    let target = 517;
    let x = (target % 40) as f64 * 3.0;
    let y = (target / 40) as f64 * 3.0;
    let found = index
        .search_bbox(&BBox::new(x + 0.25, y + 0.25, x + 0.75, y + 0.75));
    assert_eq!(found, vec![FeatureId::Number(target)]);
}

#[test]
fn test_insert_twice_is_rejected() {
    let mut index = SpatialIndex::new();
    let id = FeatureId::Number(1);
    index.insert(&id, &Geometry::Point([1.0, 1.0])).unwrap();

    let result = index.insert(&id, &Geometry::Point([2.0, 2.0]));
    assert_eq!(result, Err(SpatialIndexError::AlreadyIndexed(id)));
}

#[test]
fn test_bulk_load_with_duplicate_changes_nothing() {
    let mut index = SpatialIndex::new();
    let a = FeatureId::Number(1);
    let geometry = Geometry::Point([0.0, 0.0]);

    let result = index.load([(&a, &geometry), (&a, &geometry)]);
    assert_eq!(result, Err(SpatialIndexError::DuplicateId(a.clone())));
    assert!(index.is_empty());
}

#[test]
fn test_update_moves_feature() {
    let mut index = SpatialIndex::new();
    let id = FeatureId::from("moving");
    index.insert(&id, &Geometry::Point([0.0, 0.0])).unwrap();
    index.update(&id, &Geometry::Point([10.0, 10.0])).unwrap();

    assert!(index.search_bbox(&BBox::new(-1.0, -1.0, 1.0, 1.0)).is_empty());
    assert_eq!(index.search_bbox(&BBox::new(9.0, 9.0, 11.0, 11.0)), vec![id]);
}

#[test]
fn test_remove_unknown_id_fails() {
    let mut index = SpatialIndex::new();
    let id = FeatureId::Number(42);
    assert_eq!(index.remove(&id), Err(SpatialIndexError::NotIndexed(id)));
}

#[test]
fn test_second_remove_fails_and_keeps_others() {
    let mut index = SpatialIndex::new();
    let a = FeatureId::from("a");
    let b = FeatureId::from("b");
    index.insert(&a, &unit_square(0.0, 0.0)).unwrap();
    index.insert(&b, &unit_square(5.0, 5.0)).unwrap();

    index.remove(&a).unwrap();
    assert_eq!(index.remove(&a), Err(SpatialIndexError::NotIndexed(a.clone())));

    assert_eq!(index.len(), 1);
    assert!(index.search(&unit_square(0.0, 0.0)).unwrap().is_empty());
    assert_eq!(index.search(&unit_square(5.0, 5.0)).unwrap(), vec![b]);
}

#[test]
fn test_collides_and_clear() {
    let mut index = SpatialIndex::new();
    for i in 0..50 {
        index
            .insert(&FeatureId::Number(i), &unit_square(i as f64 * 2.0, 0.0))
            .unwrap();
    }

    assert!(index.collides(&Geometry::Point([20.5, 0.5])).unwrap());
    assert!(!index.collides(&Geometry::Point([21.5, 0.5])).unwrap());

    index.clear();
    assert!(index.is_empty());
    assert!(!index.collides(&Geometry::Point([20.5, 0.5])).unwrap());
}

#[test]
fn test_removing_most_entries_keeps_the_rest_searchable() {
    let mut index = SpatialIndex::with_max_entries(4);
    for i in 0..200 {
        index
            .insert(&FeatureId::Number(i), &Geometry::Point([i as f64, i as f64]))
            .unwrap();
    }
    for i in (0..200).filter(|i| i % 10 != 0) {
        index.remove(&FeatureId::Number(i)).unwrap();
    }

    assert_eq!(index.len(), 20);
    let mut found = index.search_bbox(&BBox::new(-1.0, -1.0, 201.0, 201.0));
    found.sort();
    let expected: Vec<FeatureId> = (0..200).step_by(10).map(FeatureId::Number).collect();
    assert_eq!(found, expected);
}
