// src/store/rest.rs
//! PostgREST-style HTTP store (`{base}/rest/v1/{table}?filters`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use super::{ConfigStore, ManufacturerStore};
use crate::proximity::types::{Location, ManufacturerRecord, ProductRecord};

// Explicit column lists; `alias:column` renames on the server so each field
// arrives exactly once.
const MANUFACTURER_COLUMNS: &str =
    "id,name:company_name,latitude,longitude,address,city,state,status,is_test_entry";
const PRODUCT_COLUMNS: &str = "id,name,description,price,image:image_url,available";

pub struct RestStore {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ManufacturerRow {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_test_entry: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    image: Option<String>,
    available: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ConfigRow {
    value: serde_json::Value,
}

fn id_as_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

impl ManufacturerRow {
    /// Rows without coordinates can't be ranked and are skipped.
    fn into_record(self) -> Option<ManufacturerRecord> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            tracing::debug!(target: "store", id = %self.id, "manufacturer without coordinates skipped");
            return None;
        };
        Some(ManufacturerRecord {
            name: self.name.unwrap_or_else(|| "Unnamed kiln".to_string()),
            id: self.id,
            products: Vec::new(),
            location: Location {
                latitude,
                longitude,
                address: self.address.unwrap_or_default(),
                city: self.city.unwrap_or_default(),
                state: self.state.unwrap_or_default(),
            },
            distance_km: None,
            status: self.status,
            is_test_entry: self.is_test_entry.unwrap_or(false),
        })
    }
}

impl From<ProductRow> for ProductRecord {
    fn from(r: ProductRow) -> Self {
        ProductRecord {
            id: r.id,
            name: r.name.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            price: r.price.unwrap_or(0.0).max(0.0),
            image: r.image.filter(|s| !s.trim().is_empty()),
            available: r.available.unwrap_or(true),
        }
    }
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("kiln-marketplace/0.1")
            .connect_timeout(Duration::from_secs(4))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(query)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("store GET {table}"))?
            .error_for_status()
            .with_context(|| format!("store GET {table} status"))?;
        resp.json::<Vec<T>>()
            .await
            .with_context(|| format!("decoding {table} rows"))
    }
}

#[async_trait]
impl ManufacturerStore for RestStore {
    async fn list_manufacturers(&self) -> Result<Vec<ManufacturerRecord>> {
        // Missing status is allowed through; only an explicit "inactive" is dropped.
        let rows: Vec<ManufacturerRow> = self
            .select(
                "manufacturers",
                &[
                    ("select", MANUFACTURER_COLUMNS),
                    ("or", "(status.is.null,status.neq.inactive)"),
                    ("is_test_entry", "not.is.true"),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(ManufacturerRow::into_record)
            .filter(ManufacturerRecord::is_listable)
            .collect())
    }

    async fn list_products(&self, manufacturer_id: &str) -> Result<Vec<ProductRecord>> {
        let id_filter = format!("eq.{manufacturer_id}");
        let rows: Vec<ProductRow> = self
            .select(
                "products",
                &[
                    ("select", PRODUCT_COLUMNS),
                    ("manufacturer_id", id_filter.as_str()),
                    ("available", "eq.true"),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }
}

#[async_trait]
impl ConfigStore for RestStore {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let key_filter = format!("eq.{key}");
        let mut rows: Vec<ConfigRow> = self
            .select(
                "app_config",
                &[("select", "value"), ("key", key_filter.as_str()), ("limit", "1")],
            )
            .await?;
        Ok(rows.pop().map(|r| r.value))
    }
}
