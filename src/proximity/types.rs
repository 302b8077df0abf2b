// src/proximity/types.rs
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// Id used for the synthetic product shown when a manufacturer has none.
pub const PLACEHOLDER_PRODUCT_ID: &str = "placeholder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl ProductRecord {
    /// Display-only stand-in; never written back to the store.
    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_PRODUCT_ID.to_string(),
            name: "Standard Red Bricks".to_string(),
            description: "Contact the manufacturer for current products and pricing.".to_string(),
            price: 0.0,
            image: None,
            available: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_PRODUCT_ID
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    pub location: Location,
    /// Filled in per query while ranking; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub is_test_entry: bool,
}

impl ManufacturerRecord {
    /// Active unless explicitly flagged otherwise. A missing or unknown status
    /// counts as active.
    pub fn is_listable(&self) -> bool {
        if self.is_test_entry {
            return false;
        }
        !self
            .status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("inactive"))
    }
}

/// Add one placeholder product to every manufacturer that has none.
pub fn with_placeholder_products(mut list: Vec<ManufacturerRecord>) -> Vec<ManufacturerRecord> {
    for m in list.iter_mut() {
        if m.products.is_empty() {
            m.products.push(ProductRecord::placeholder());
        }
    }
    list
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl FallbackLocation {
    pub fn is_empty(&self) -> bool {
        [&self.city, &self.district, &self.state]
            .iter()
            .all(|h| h.as_deref().map(str::trim).unwrap_or_default().is_empty())
    }
}

/// Where the reference point for ranking comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Precise(Coordinates),
    Fallback(FallbackLocation),
}

/// Which cascade tier produced the result when live location was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackTier {
    City,
    District,
    State,
    Default,
}

impl FallbackTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTier::City => "city",
            FallbackTier::District => "district",
            FallbackTier::State => "state",
            FallbackTier::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedManufacturers {
    pub manufacturers: Vec<ManufacturerRecord>,
    pub location_success: bool,
    pub fallback_used: Option<FallbackTier>,
}

impl RankedManufacturers {
    pub fn empty() -> Self {
        Self {
            manufacturers: Vec::new(),
            location_success: false,
            fallback_used: None,
        }
    }
}
