use std::path::Path;

use crashdash::data::query;
use crashdash::{DatasetCache, InjuryCategory, QueryError};

fn fixture_path() -> &'static Path {
    Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/sample_collisions.csv"
    ))
}

#[test]
fn full_pipeline() {
    let mut cache = DatasetCache::new(fixture_path());
    let dataset = cache.load(1000).expect("failed to load fixture");

    // 7 raw rows, one dropped for missing coordinates.
    assert_eq!(dataset.len(), 6);
    assert!(dataset.columns.contains(&"date/time".to_string()));
    assert!(dataset.columns.contains(&"borough".to_string()));

    // Point map: five records carry an injured_persons count.
    assert_eq!(query::injury_threshold_points(&dataset, 0).len(), 5);
    assert_eq!(query::injury_threshold_points(&dataset, 2).len(), 2);

    // Density map for the 18:00 hour.
    let evening = query::hour_indices(&dataset, 18).unwrap();
    assert_eq!(evening.len(), 2);
    let (lat, lon) = query::centroid(&dataset, &evening).unwrap();
    assert!((lat - 40.785).abs() < 1e-9);
    assert!((lon + 73.835).abs() < 1e-9);

    // Minute histogram for the 05:00 hour.
    let morning = query::hour_indices(&dataset, 5).unwrap();
    assert_eq!(morning.len(), 3);
    let bins = query::minute_histogram(&dataset, &morning, 5).unwrap();
    assert_eq!(bins[10], 2);
    assert_eq!(bins[25], 1);
    assert_eq!(bins.iter().sum::<u32>(), 3);

    // Street ranking: the tie keeps insertion order.
    let top = query::top_streets(&dataset, InjuryCategory::Cyclists, 5);
    assert_eq!(
        top,
        vec![
            ("BROADWAY".to_string(), 3),
            ("MAIN ST".to_string(), 3),
            ("5TH AVE".to_string(), 1),
        ]
    );
}

#[test]
fn empty_hour_has_no_centroid() {
    let mut cache = DatasetCache::new(fixture_path());
    let dataset = cache.load(1000).unwrap();

    let indices = query::hour_indices(&dataset, 9).unwrap();
    assert!(indices.is_empty());
    assert_eq!(
        query::centroid(&dataset, &indices),
        Err(QueryError::EmptySelection)
    );

    // The histogram still returns its 60 zero bins.
    let bins = query::minute_histogram(&dataset, &indices, 9).unwrap();
    assert_eq!(bins.iter().sum::<u32>(), 0);
}

#[test]
fn memoized_loads_are_value_transparent() {
    let mut cache = DatasetCache::new(fixture_path());
    let first = cache.load(1000).unwrap();
    let second = cache.load(1000).unwrap();
    assert_eq!(*first, *second);

    // A fresh cache over the same file gives the same value too.
    let mut fresh = DatasetCache::new(fixture_path());
    assert_eq!(*fresh.load(1000).unwrap(), *first);
}

#[test]
fn every_loaded_record_is_geolocated() {
    let mut cache = DatasetCache::new(fixture_path());
    let dataset = cache.load(1000).unwrap();
    assert!(dataset
        .records
        .iter()
        .all(|r| r.latitude.is_finite() && r.longitude.is_finite()));
}

#[test]
fn hour_filters_cover_the_whole_dataset() {
    let mut cache = DatasetCache::new(fixture_path());
    let dataset = cache.load(1000).unwrap();

    let total: usize = (0..24)
        .map(|h| query::hour_indices(&dataset, h).unwrap().len())
        .sum();
    assert_eq!(total, dataset.len());
}
