// src/lib.rs
// Public library surface for integration tests (and the Shuttle binary).

pub mod api;
pub mod config;
pub mod content;
pub mod geo;
pub mod metrics;
pub mod proximity;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::content::ContentAggregator;
pub use crate::proximity::ProximityMatcher;

use crate::content::source_config::StoredSourceConfig;
use crate::content::types::ContentSourceConfig;
use crate::proximity::locator::UnavailableLocator;
use crate::store::{ConfigStore, InMemoryStore, ManufacturerStore, RestStore};

/// Build the full app from an explicit config.
pub async fn app_with_config(cfg: AppConfig) -> Result<Router> {
    let (manufacturers, config_store): (Arc<dyn ManufacturerStore>, Arc<dyn ConfigStore>) =
        match cfg.store.base_url.as_deref() {
            Some(base) => {
                let s = Arc::new(RestStore::new(base, cfg.store.api_key.clone()));
                let m: Arc<dyn ManufacturerStore> = s.clone();
                let c: Arc<dyn ConfigStore> = s;
                (m, c)
            }
            None => {
                info!("no store base_url configured; using empty in-memory store");
                let s = Arc::new(InMemoryStore::default());
                let m: Arc<dyn ManufacturerStore> = s.clone();
                let c: Arc<dyn ConfigStore> = s;
                (m, c)
            }
        };

    let matcher = ProximityMatcher::new(
        manufacturers,
        Arc::new(UnavailableLocator),
        cfg.proximity.clone(),
    );

    let defaults = ContentSourceConfig {
        blog_id: cfg.content.default_blog_id.clone(),
        api_key: cfg.content.default_api_key.clone(),
    };
    let (retrieval, miner) = content::build_retrieval(&cfg.content)?;
    let mut aggregator = ContentAggregator::connect(
        Arc::new(StoredSourceConfig::new(config_store)),
        defaults,
        retrieval,
    )
    .await;
    if let Some(miner) = miner {
        aggregator = aggregator.with_label_miner(miner, cfg.content.label_mining_page_size);
    }

    let metrics = metrics::Metrics::init()?;
    let state = AppState {
        matcher: Arc::new(matcher),
        content: Arc::new(aggregator),
        default_page_size: cfg.content.default_page_size,
    };
    info!(
        radius_km = ?cfg.proximity.radius_km,
        content_kind = ?cfg.content.kind,
        "marketplace app built"
    );
    Ok(router(state).merge(metrics.router()))
}

/// Build the app from `config/marketplace.{toml,json}` (or $MARKETPLACE_CONFIG_PATH).
pub async fn app() -> Result<Router> {
    let cfg = AppConfig::load_default()?;
    app_with_config(cfg).await
}
