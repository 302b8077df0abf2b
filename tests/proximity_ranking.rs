// tests/proximity_ranking.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use kiln_marketplace::config::ProximitySettings;
use kiln_marketplace::geo::Coordinates;
use kiln_marketplace::proximity::locator::{DeviceLocator, FixedLocator, UnavailableLocator};
use kiln_marketplace::proximity::types::{
    FallbackLocation, FallbackTier, Location, ManufacturerRecord, ProductRecord,
};
use kiln_marketplace::proximity::{NearbyRequest, ProximityMatcher};
use kiln_marketplace::store::{InMemoryStore, ManufacturerStore};

fn kiln(id: &str, city: &str, state: &str, lat: f64, lon: f64) -> ManufacturerRecord {
    ManufacturerRecord {
        id: id.into(),
        name: format!("{city} Bricks"),
        products: vec![],
        location: Location {
            latitude: lat,
            longitude: lon,
            address: format!("Industrial Area, {city}"),
            city: city.into(),
            state: state.into(),
        },
        distance_km: None,
        status: None,
        is_test_entry: false,
    }
}

fn delhi_mumbai() -> Vec<ManufacturerRecord> {
    vec![
        kiln("1", "Delhi", "Delhi", 28.6, 77.2),
        kiln("2", "Mumbai", "Maharashtra", 19.07, 72.88),
    ]
}

fn matcher(
    seed: Vec<ManufacturerRecord>,
    locator: Arc<dyn DeviceLocator>,
    settings: ProximitySettings,
) -> ProximityMatcher {
    ProximityMatcher::new(Arc::new(InMemoryStore::new(seed)), locator, settings)
}

struct Denied;

#[async_trait]
impl DeviceLocator for Denied {
    async fn locate(&self) -> Result<Coordinates> {
        Err(anyhow!("permission denied"))
    }
    fn name(&self) -> &'static str {
        "denied"
    }
}

struct Hanging;

#[async_trait]
impl DeviceLocator for Hanging {
    async fn locate(&self) -> Result<Coordinates> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Coordinates::new(28.7, 77.1))
    }
    fn name(&self) -> &'static str {
        "hanging"
    }
}

#[tokio::test]
async fn requester_in_delhi_without_radius_gets_both_sorted() {
    let settings = ProximitySettings {
        radius_km: None,
        ..Default::default()
    };
    let m = matcher(delhi_mumbai(), Arc::new(UnavailableLocator), settings);
    let out = m
        .find_nearby(NearbyRequest {
            coordinates: Some(Coordinates::new(28.7, 77.1)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(out.location_success);
    assert_eq!(out.fallback_used, None);
    let ids: Vec<_> = out.manufacturers.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
    let d0 = out.manufacturers[0].distance_km.unwrap();
    let d1 = out.manufacturers[1].distance_km.unwrap();
    assert!(d0 > 10.0 && d0 < 20.0, "delhi distance {d0}");
    assert!(d1 > 1100.0 && d1 < 1200.0, "mumbai distance {d1}");
    // two-decimal rounding
    assert_eq!((d0 * 100.0).round() / 100.0, d0);
}

#[tokio::test]
async fn default_radius_trims_far_manufacturers() {
    let m = matcher(delhi_mumbai(), Arc::new(UnavailableLocator), ProximitySettings::default());
    let out = m
        .find_nearby(NearbyRequest {
            coordinates: Some(Coordinates::new(28.7, 77.1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.manufacturers.len(), 1);
    assert_eq!(out.manufacturers[0].id, "1");
}

#[tokio::test]
async fn radius_never_empties_the_result() {
    let m = matcher(delhi_mumbai(), Arc::new(UnavailableLocator), ProximitySettings::default());
    // Chennai: both kilns are > 500 km away
    let out = m
        .find_nearby(NearbyRequest {
            coordinates: Some(Coordinates::new(13.08, 80.27)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.manufacturers.len(), 2);
    assert_eq!(out.manufacturers[0].id, "2");
}

#[tokio::test]
async fn live_geolocation_counts_as_success() {
    let m = matcher(
        delhi_mumbai(),
        Arc::new(FixedLocator(Coordinates::new(19.1, 72.9))),
        ProximitySettings::default(),
    );
    let out = m.find_nearby(NearbyRequest::default()).await.unwrap();
    assert!(out.location_success);
    assert_eq!(out.manufacturers[0].id, "2");
}

#[tokio::test]
async fn denied_geolocation_falls_back_to_city() {
    let m = matcher(delhi_mumbai(), Arc::new(Denied), ProximitySettings::default());
    let out = m
        .find_nearby(NearbyRequest {
            fallback: FallbackLocation {
                city: Some("mumbai".into()),
                district: None,
                state: Some("Delhi".into()),
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!out.location_success);
    assert_eq!(out.fallback_used, Some(FallbackTier::City));
    assert_eq!(out.manufacturers.len(), 1);
    assert_eq!(out.manufacturers[0].id, "2");
    assert!(out.manufacturers[0].distance_km.is_none());
}

#[tokio::test]
async fn timed_out_geolocation_uses_state_hint() {
    let settings = ProximitySettings {
        geolocation_timeout_ms: 30,
        ..Default::default()
    };
    let m = matcher(delhi_mumbai(), Arc::new(Hanging), settings);
    let out = m
        .find_nearby(NearbyRequest {
            fallback: FallbackLocation {
                city: Some("Pune".into()),
                district: Some("Haveli".into()),
                state: Some("maharashtra".into()),
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.fallback_used, Some(FallbackTier::State));
    assert_eq!(out.manufacturers[0].id, "2");
}

#[tokio::test]
async fn no_hints_ranks_everyone_from_default_city() {
    let mut seed = delhi_mumbai();
    seed.push(kiln("3", "Chennai", "Tamil Nadu", 13.08, 80.27));
    let m = matcher(seed, Arc::new(Denied), ProximitySettings::default());
    let out = m.find_nearby(NearbyRequest::default()).await.unwrap();

    assert!(!out.location_success);
    assert_eq!(out.fallback_used, Some(FallbackTier::Default));
    let ids: Vec<_> = out.manufacturers.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert!(out
        .manufacturers
        .windows(2)
        .all(|w| w[0].distance_km <= w[1].distance_km));
}

#[tokio::test]
async fn unmatched_hints_also_reach_default_tier() {
    let m = matcher(delhi_mumbai(), Arc::new(Denied), ProximitySettings::default());
    let out = m
        .find_nearby(NearbyRequest {
            fallback: FallbackLocation {
                city: Some("Kolkata".into()),
                district: Some("Howrah".into()),
                state: Some("West Bengal".into()),
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.fallback_used, Some(FallbackTier::Default));
    assert_eq!(out.manufacturers.len(), 2);
}

#[tokio::test]
async fn empty_source_is_empty_result_not_error() {
    let m = matcher(vec![], Arc::new(FixedLocator(Coordinates::new(28.7, 77.1))), ProximitySettings::default());
    let out = m.find_nearby(NearbyRequest::default()).await.unwrap();
    assert!(out.manufacturers.is_empty());
    assert!(!out.location_success);
    assert_eq!(out.fallback_used, None);
}

#[tokio::test]
async fn supplied_list_skips_the_store() {
    let store = Arc::new(InMemoryStore::new(delhi_mumbai()));
    let m = ProximityMatcher::new(
        store.clone(),
        Arc::new(UnavailableLocator),
        ProximitySettings::default(),
    );
    let out = m
        .find_nearby(NearbyRequest {
            coordinates: Some(Coordinates::new(28.7, 77.1)),
            manufacturers: Some(vec![kiln("9", "Agra", "Uttar Pradesh", 27.18, 78.01)]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.manufacturers.len(), 1);
    assert_eq!(out.manufacturers[0].id, "9");
    assert!(store.product_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reused_list_loses_stale_distances_on_city_tier() {
    let m = matcher(vec![], Arc::new(Denied), ProximitySettings::default());
    let mut list = delhi_mumbai();
    for k in list.iter_mut() {
        k.distance_km = Some(13.37);
    }
    let out = m
        .find_nearby(NearbyRequest {
            manufacturers: Some(list),
            fallback: FallbackLocation {
                city: Some("Mumbai".into()),
                district: None,
                state: None,
            },
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.fallback_used, Some(FallbackTier::City));
    assert_eq!(out.manufacturers.len(), 1);
    assert_eq!(out.manufacturers[0].id, "2");
    assert_eq!(out.manufacturers[0].distance_km, None);
}

#[tokio::test]
async fn store_filters_flagged_records_but_keeps_missing_status() {
    let mut inactive = kiln("3", "Delhi", "Delhi", 28.61, 77.21);
    inactive.status = Some("inactive".into());
    let mut test_entry = kiln("4", "Delhi", "Delhi", 28.62, 77.22);
    test_entry.is_test_entry = true;
    let mut pending = kiln("5", "Delhi", "Delhi", 28.63, 77.23);
    pending.status = Some("pending".into());
    let mut with_products = kiln("1", "Delhi", "Delhi", 28.6, 77.2);
    with_products.products = vec![
        ProductRecord {
            id: "p1".into(),
            name: "Red bricks".into(),
            description: String::new(),
            price: 8.0,
            image: None,
            available: true,
        },
        ProductRecord {
            id: "p2".into(),
            name: "Sold out".into(),
            description: String::new(),
            price: 9.0,
            image: None,
            available: false,
        },
    ];

    let store = InMemoryStore::new(vec![with_products, inactive, test_entry, pending]);
    let listed = store.list_manufacturers().await.unwrap();
    let ids: Vec<_> = listed.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["1", "5"]);

    let m = ProximityMatcher::new(
        Arc::new(store),
        Arc::new(UnavailableLocator),
        ProximitySettings::default(),
    );
    let loaded = m.load_manufacturers().await.unwrap();
    assert_eq!(loaded[0].products.len(), 1);
    assert_eq!(loaded[0].products[0].id, "p1");
    assert!(loaded[1].products.is_empty());
}
