// src/proximity/mod.rs
//! Manufacturer proximity matching.
//!
//! Resolves a reference point (caller coordinates, live device fix, or the
//! locality cascade), then ranks manufacturers by haversine distance with a
//! soft radius that never empties a non-empty result.

pub mod cascade;
pub mod locator;
pub mod types;

use anyhow::{Context, Result};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProximitySettings;
use crate::geo::{distance_km, Coordinates};
use crate::store::ManufacturerStore;
use locator::DeviceLocator;
use types::{FallbackLocation, FallbackTier, LocationQuery, ManufacturerRecord, RankedManufacturers};

/// One ranking request. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct NearbyRequest {
    pub coordinates: Option<Coordinates>,
    /// Pre-fetched manufacturers; fetched from the store when `None`.
    pub manufacturers: Option<Vec<ManufacturerRecord>>,
    pub fallback: FallbackLocation,
}

impl From<LocationQuery> for NearbyRequest {
    fn from(q: LocationQuery) -> Self {
        match q {
            LocationQuery::Precise(c) => Self {
                coordinates: Some(c),
                ..Default::default()
            },
            LocationQuery::Fallback(hints) => Self {
                fallback: hints,
                ..Default::default()
            },
        }
    }
}

pub struct ProximityMatcher {
    store: Arc<dyn ManufacturerStore>,
    locator: Arc<dyn DeviceLocator>,
    settings: ProximitySettings,
}

impl ProximityMatcher {
    pub fn new(
        store: Arc<dyn ManufacturerStore>,
        locator: Arc<dyn DeviceLocator>,
        settings: ProximitySettings,
    ) -> Self {
        Self {
            store,
            locator,
            settings,
        }
    }

    /// Fetch every listable manufacturer with its available products.
    /// A product lookup that fails leaves that manufacturer with an empty catalogue.
    pub async fn load_manufacturers(&self) -> Result<Vec<ManufacturerRecord>> {
        let mut list = self
            .store
            .list_manufacturers()
            .await
            .context("listing manufacturers")?;
        for m in list.iter_mut() {
            match self.store.list_products(&m.id).await {
                Ok(products) => m.products = products,
                Err(e) => {
                    tracing::warn!(target: "proximity", manufacturer = %m.id, error = ?e, "product lookup failed");
                }
            }
        }
        Ok(list)
    }

    /// Rank manufacturers for one request. Degraded location never errors;
    /// only a failing store does.
    pub async fn find_nearby(&self, req: NearbyRequest) -> Result<RankedManufacturers> {
        crate::metrics::ensure_described();

        let manufacturers = match req.manufacturers {
            // Distances are per query; drop whatever a previous ranking left behind.
            Some(mut list) => {
                list.iter_mut().for_each(|m| m.distance_km = None);
                list
            }
            None => self.load_manufacturers().await?,
        };
        if manufacturers.is_empty() {
            tracing::info!(target: "proximity", "no manufacturers to rank");
            counter!("proximity_queries_total", "tier" => "empty").increment(1);
            return Ok(RankedManufacturers::empty());
        }

        let live = match req.coordinates.filter(Coordinates::is_valid) {
            Some(c) => Some(c),
            None => {
                let timeout = Duration::from_millis(self.settings.geolocation_timeout_ms);
                locator::locate_within(self.locator.as_ref(), timeout).await
            }
        };

        let result = match live {
            Some(origin) => RankedManufacturers {
                manufacturers: rank_by_distance(manufacturers, &origin, self.settings.radius_km),
                location_success: true,
                fallback_used: None,
            },
            None => {
                counter!("proximity_geolocation_failures_total").increment(1);
                self.fallback(manufacturers, &req.fallback)
            }
        };

        let tier = result.fallback_used.map(|t| t.as_str()).unwrap_or("live");
        counter!("proximity_queries_total", "tier" => tier).increment(1);
        tracing::info!(
            target: "proximity",
            tier,
            results = result.manufacturers.len(),
            location_success = result.location_success,
            "ranked manufacturers"
        );
        Ok(result)
    }

    fn fallback(
        &self,
        manufacturers: Vec<ManufacturerRecord>,
        hints: &FallbackLocation,
    ) -> RankedManufacturers {
        if let Some((hits, tier)) = cascade::match_locality(&manufacturers, hints) {
            return RankedManufacturers {
                manufacturers: hits,
                location_success: false,
                fallback_used: Some(tier),
            };
        }

        let origin = self.settings.default_city.coordinates();
        tracing::debug!(
            target: "proximity",
            city = %self.settings.default_city.name,
            "ranking from default city"
        );
        // Every manufacturer is kept on this tier.
        RankedManufacturers {
            manufacturers: rank_by_distance(manufacturers, &origin, None),
            location_success: false,
            fallback_used: Some(FallbackTier::Default),
        }
    }
}

/// Attach distances from `origin`, sort ascending, then apply the soft radius:
/// if nothing lies within `radius_km`, the full sorted list is returned.
pub fn rank_by_distance(
    mut manufacturers: Vec<ManufacturerRecord>,
    origin: &Coordinates,
    radius_km: Option<f64>,
) -> Vec<ManufacturerRecord> {
    for m in manufacturers.iter_mut() {
        let d = distance_km(origin, &m.location.coordinates());
        m.distance_km = d.is_finite().then_some(d);
    }
    // Stable sort keeps store order for equal distances; unknown distances sink.
    manufacturers.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::INFINITY);
        let db = b.distance_km.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });

    let Some(radius) = radius_km else {
        return manufacturers;
    };
    let within = manufacturers
        .iter()
        .take_while(|m| m.distance_km.is_some_and(|d| d <= radius))
        .count();
    if within == 0 {
        return manufacturers;
    }
    manufacturers.truncate(within);
    manufacturers
}
