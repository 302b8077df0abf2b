// src/content/source_config.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::content::types::ContentSourceConfig;
use crate::store::ConfigStore;

/// Key under which the admin panel stores the blog source.
pub const BLOG_SOURCE_KEY: &str = "blog_source";

/// Where the aggregator reads its content source from on `refresh()`.
#[async_trait]
pub trait SourceConfigProvider: Send + Sync {
    async fn load(&self) -> Result<ContentSourceConfig>;
}

/// Fixed source (tests, config-file-only deployments).
pub struct StaticSourceConfig(pub ContentSourceConfig);

#[async_trait]
impl SourceConfigProvider for StaticSourceConfig {
    async fn load(&self) -> Result<ContentSourceConfig> {
        Ok(self.0.clone())
    }
}

/// Reads `{ "blogId": .., "apiKey": .. }` from the key/value config table.
pub struct StoredSourceConfig {
    store: Arc<dyn ConfigStore>,
}

impl StoredSourceConfig {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SourceConfigProvider for StoredSourceConfig {
    async fn load(&self) -> Result<ContentSourceConfig> {
        let value = self
            .store
            .get_value(BLOG_SOURCE_KEY)
            .await
            .context("reading blog source config")?
            .ok_or_else(|| anyhow!("blog source not configured"))?;
        let cfg: ContentSourceConfig =
            serde_json::from_value(value).context("decoding blog source config")?;
        if cfg.blog_id.trim().is_empty() {
            return Err(anyhow!("blog source has empty blog id"));
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn stored_config_round_trips_through_store() {
        let store = Arc::new(InMemoryStore::new(vec![]));
        let provider = StoredSourceConfig::new(store.clone());
        assert!(provider.load().await.is_err());

        store.set_value(
            BLOG_SOURCE_KEY,
            serde_json::json!({"blogId": "99", "apiKey": "secret"}),
        );
        let cfg = provider.load().await.unwrap();
        assert_eq!(cfg.blog_id, "99");
        assert_eq!(cfg.api_key, "secret");

        store.set_value(BLOG_SOURCE_KEY, serde_json::json!({"blogId": " ", "apiKey": "k"}));
        assert!(provider.load().await.is_err());
    }
}
