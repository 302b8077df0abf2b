// src/store/mod.rs
//! Persistence collaborator: manufacturer/product projections and the
//! key/value application config table.

pub mod memory;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;

use crate::proximity::types::{ManufacturerRecord, ProductRecord};

pub use memory::InMemoryStore;
pub use rest::RestStore;

/// Read side of the marketplace store. "No rows" is an empty Vec, never an error.
#[async_trait]
pub trait ManufacturerStore: Send + Sync {
    /// Listable manufacturers (test entries and explicitly inactive ones left out),
    /// without products.
    async fn list_manufacturers(&self) -> Result<Vec<ManufacturerRecord>>;
    /// Available products for one manufacturer, in store order.
    async fn list_products(&self, manufacturer_id: &str) -> Result<Vec<ProductRecord>>;
}

/// Arbitrary JSON values keyed by name (admin-managed settings).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>>;
}
