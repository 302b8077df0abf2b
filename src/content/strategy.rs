// src/content/strategy.rs
use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;

use crate::content::types::{ContentSourceConfig, PageQuery, PostPage};

/// What kind of transport a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManagedFunction,
    DirectApi,
    Feed,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManagedFunction => "managed_function",
            Capability::DirectApi => "direct_api",
            Capability::Feed => "feed",
        }
    }
}

/// One way of getting a page of posts.
///
/// `Ok(Some(_))` is a success (an empty page included), `Ok(None)` means the
/// strategy produced nothing usable, `Err` is a transport/decode failure.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn capability(&self) -> Capability;
    fn name(&self) -> &'static str;
    async fn fetch(
        &self,
        source: &ContentSourceConfig,
        query: &PageQuery,
    ) -> Result<Option<PostPage>>;
}

pub type DynStrategy = Arc<dyn FetchStrategy>;

/// Try strategies strictly in order and return the first success together with
/// the capability that produced it. Failures are logged and never propagated.
pub async fn first_success(
    strategies: &[DynStrategy],
    source: &ContentSourceConfig,
    query: &PageQuery,
) -> Option<(Capability, PostPage)> {
    for s in strategies {
        let t0 = std::time::Instant::now();
        counter!("content_strategy_attempts_total", "strategy" => s.name()).increment(1);
        let outcome = s.fetch(source, query).await;
        histogram!("content_fetch_ms", "strategy" => s.name())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(Some(page)) => {
                tracing::debug!(
                    target: "content",
                    strategy = s.name(),
                    posts = page.posts.len(),
                    "strategy succeeded"
                );
                return Some((s.capability(), page));
            }
            Ok(None) => {
                tracing::info!(target: "content", strategy = s.name(), "strategy returned no posts field");
            }
            Err(e) => {
                tracing::warn!(target: "content", strategy = s.name(), error = ?e, "strategy failed");
            }
        }
        counter!("content_strategy_failures_total", "strategy" => s.name()).increment(1);
    }
    None
}
