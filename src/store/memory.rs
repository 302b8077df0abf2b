// src/store/memory.rs
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ConfigStore, ManufacturerStore};
use crate::proximity::types::{ManufacturerRecord, ProductRecord};

/// In-process store for tests and demos. Products attached to the seeded
/// records are split out so they come back through `list_products`.
#[derive(Default)]
pub struct InMemoryStore {
    manufacturers: Vec<ManufacturerRecord>,
    products: HashMap<String, Vec<ProductRecord>>,
    values: Mutex<HashMap<String, serde_json::Value>>,
    pub product_calls: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new(seed: Vec<ManufacturerRecord>) -> Self {
        let mut manufacturers = Vec::with_capacity(seed.len());
        let mut products = HashMap::new();
        for mut m in seed {
            products.insert(m.id.clone(), std::mem::take(&mut m.products));
            manufacturers.push(m);
        }
        Self {
            manufacturers,
            products,
            ..Default::default()
        }
    }

    pub fn set_value(&self, key: &str, value: serde_json::Value) {
        self.values
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl ManufacturerStore for InMemoryStore {
    async fn list_manufacturers(&self) -> Result<Vec<ManufacturerRecord>> {
        Ok(self
            .manufacturers
            .iter()
            .filter(|m| m.is_listable())
            .cloned()
            .collect())
    }

    async fn list_products(&self, manufacturer_id: &str) -> Result<Vec<ProductRecord>> {
        self.product_calls
            .lock()
            .expect("store mutex poisoned")
            .push(manufacturer_id.to_string());
        Ok(self
            .products
            .get(manufacturer_id)
            .map(|v| v.iter().filter(|p| p.available).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }
}
