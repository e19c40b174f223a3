//! Tests for lease and cage ingestion.

use baysense_common::feature::{ingest_cages, ingest_feature_collection, search_features};
use baysense_common::{CageRecord, FeatureGeometry, FeatureKind, LeaseStatus};
use serde_json::json;
use test_utils::{
    assert_lonlat_approx_eq, cages, create_lease_grid, lease_collection,
    LEASE_COLLECTION_MALFORMED, LEASE_COLLECTION_VALID,
};

// ============================================================================
// Lease collections
// ============================================================================

#[test]
fn test_malformed_features_are_skipped_not_fatal() {
    let ingest = ingest_feature_collection(&lease_collection()).unwrap();
    assert_eq!(ingest.features.len(), LEASE_COLLECTION_VALID);
    let skipped: Vec<usize> = ingest.errors.iter().map(|e| e.index).collect();
    assert_eq!(skipped, LEASE_COLLECTION_MALFORMED);
    assert_eq!(
        ingest.summary().as_deref(),
        Some("2 lease areas could not be displayed.")
    );
}

#[test]
fn test_status_and_properties_resolved_once() {
    let ingest = ingest_feature_collection(&lease_collection()).unwrap();
    let statuses: Vec<LeaseStatus> = ingest.features.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![
            LeaseStatus::Valid,
            LeaseStatus::ForRenewal,
            LeaseStatus::Expired
        ]
    );

    let b = &ingest.features[1];
    assert_eq!(b.id.as_str(), "FLA-002");
    assert_eq!(b.kind, FeatureKind::Lease);
    assert_eq!(b.properties.area, Some(2.25));
    assert_eq!(b.properties.location(), "Banga, Talisay, Batangas");
}

#[test]
fn test_not_a_collection_is_an_error() {
    assert!(ingest_feature_collection(&json!({"type": "Feature"})).is_err());
    assert!(ingest_feature_collection(&json!([1, 2, 3])).is_err());
}

#[test]
fn test_duplicate_ids_are_made_unique() {
    let mut fc = create_lease_grid((121.0, 14.0), 2, 0.001);
    fc["features"][1]["properties"]["FLA Number"] = json!("GEN-0");
    let ingest = ingest_feature_collection(&fc).unwrap();
    assert_ne!(ingest.features[0].id, ingest.features[1].id);
}

#[test]
fn test_midpoint_is_mean_of_ring() {
    let ingest = ingest_feature_collection(&lease_collection()).unwrap();
    let (lon, lat) = ingest.features[0].geometry.midpoint().unwrap();
    // Closed ring repeats the first vertex, which pulls the mean toward it.
    assert_lonlat_approx_eq!(
        (lon, lat),
        (
            (121.3290 * 3.0 + 121.3300 * 2.0) / 5.0,
            (14.0775 * 3.0 + 14.0785 * 2.0) / 5.0
        ),
        1e-9
    );
}

#[test]
fn test_search_by_barangay_and_municipality() {
    let ingest = ingest_feature_collection(&lease_collection()).unwrap();
    let hits = search_features(&ingest.features, "talisay");
    assert_eq!(hits.len(), 2);
    let hits = search_features(&ingest.features, "CALOOCAN");
    assert_eq!(hits[0].id.as_str(), "FLA-003");
    assert!(search_features(&ingest.features, "  ").is_empty());
}

// ============================================================================
// Cages
// ============================================================================

#[test]
fn test_cages_become_point_features() {
    let records: Vec<CageRecord> = serde_json::from_value(cages()).unwrap();
    let ingest = ingest_cages(&records);
    assert_eq!(ingest.features.len(), 3);
    assert!(ingest
        .features
        .iter()
        .all(|f| f.kind == FeatureKind::Cage && matches!(f.geometry, FeatureGeometry::Point(_))));
    assert_eq!(ingest.features[2].id.as_str(), "c-3");
    assert_eq!(ingest.features[0].name(), "Cage Alpha");
}
