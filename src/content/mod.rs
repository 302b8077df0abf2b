// src/content/mod.rs
//! Blog content aggregation.
//!
//! A page of posts comes either from the strategy chain (managed function,
//! then direct API; first success wins) or from one explicitly configured
//! standalone feed. Label facets are counted over the returned page, with a
//! one-off larger fetch when the page carried no labels at all.

pub mod feeds;
pub mod labels;
pub mod normalize;
pub mod providers;
pub mod source_config;
pub mod strategy;
pub mod types;

use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::config::{ContentSettings, ContentSourceKind};
use feeds::FeedSource;
use source_config::SourceConfigProvider;
use strategy::{first_success, Capability, DynStrategy};
use types::{ContentPost, ContentSourceConfig, PageQuery};

/// How pages are retrieved.
pub enum Retrieval {
    Chain(Vec<DynStrategy>),
    Feed(Arc<dyn FeedSource>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlogPage {
    pub posts: Vec<ContentPost>,
    /// 0 = unknown.
    pub total_pages: u32,
    pub labels: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_by: Option<Capability>,
}

impl BlogPage {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

pub struct ContentAggregator {
    source: RwLock<ContentSourceConfig>,
    defaults: ContentSourceConfig,
    provider: Arc<dyn SourceConfigProvider>,
    retrieval: Retrieval,
    label_miner: Option<DynStrategy>,
    label_mining_page_size: u32,
}

impl ContentAggregator {
    /// Start from an already-known source. `defaults` is used whenever a
    /// refresh fails.
    pub fn new(
        source: ContentSourceConfig,
        defaults: ContentSourceConfig,
        provider: Arc<dyn SourceConfigProvider>,
        retrieval: Retrieval,
    ) -> Self {
        Self {
            source: RwLock::new(source),
            defaults,
            provider,
            retrieval,
            label_miner: None,
            label_mining_page_size: 50,
        }
    }

    /// Load the source once from `provider`, falling back to `defaults`.
    pub async fn connect(
        provider: Arc<dyn SourceConfigProvider>,
        defaults: ContentSourceConfig,
        retrieval: Retrieval,
    ) -> Self {
        let agg = Self::new(defaults.clone(), defaults, provider, retrieval);
        agg.refresh().await;
        agg
    }

    /// Strategy used for the extra label-only fetch of at most 50 posts.
    pub fn with_label_miner(mut self, miner: DynStrategy, page_size: u32) -> Self {
        self.label_miner = Some(miner);
        self.label_mining_page_size = page_size.clamp(1, 50);
        self
    }

    /// Current content source (cheap clone).
    pub fn source(&self) -> ContentSourceConfig {
        self.source
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the source from the provider. On failure the built-in default
    /// is installed instead; returns whether the provider succeeded.
    pub async fn refresh(&self) -> bool {
        let (fresh, ok) = match self.provider.load().await {
            Ok(cfg) => (cfg, true),
            Err(e) => {
                tracing::warn!(target: "content", error = ?e, "content source load failed; using built-in default");
                (self.defaults.clone(), false)
            }
        };
        tracing::info!(target: "content", blog_id = %fresh.blog_id, loaded = ok, "content source set");
        *self.source.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        ok
    }

    /// Fetch one page plus label facets.
    ///
    /// On the chain path nothing errors: if every strategy fails the page is
    /// empty with `total_pages == 0`, and callers must check for that. An
    /// explicitly configured feed that cannot be parsed does return `Err`.
    pub async fn fetch_posts(&self, query: PageQuery) -> Result<BlogPage> {
        crate::metrics::ensure_described();
        let source = self.source();

        let (page, served_by) = match &self.retrieval {
            Retrieval::Chain(strategies) => match first_success(strategies, &source, &query).await {
                Some((cap, page)) => (page, Some(cap)),
                None => {
                    tracing::warn!(target: "content", page = query.page, "all fetch strategies failed");
                    (Default::default(), None)
                }
            },
            Retrieval::Feed(feed) => {
                let page = feed.fetch_page(&query).await?;
                (page, Some(Capability::Feed))
            }
        };

        let mut labels = labels::label_counts(&page.posts);
        if labels.is_empty() {
            labels = self.mine_labels(&source).await;
        }

        tracing::info!(
            target: "content",
            page = query.page,
            posts = page.posts.len(),
            total_pages = page.total_pages,
            labels = labels.len(),
            served_by = served_by.map(|c| c.as_str()).unwrap_or("none"),
            "blog page served"
        );
        Ok(BlogPage {
            posts: page.posts,
            total_pages: page.total_pages,
            labels,
            served_by,
        })
    }

    /// One larger unfiltered fetch used only for its labels.
    async fn mine_labels(&self, source: &ContentSourceConfig) -> BTreeMap<String, usize> {
        let Some(miner) = &self.label_miner else {
            return BTreeMap::new();
        };
        let q = PageQuery::new(1, self.label_mining_page_size, None);
        match miner.fetch(source, &q).await {
            Ok(Some(page)) => labels::label_counts(&page.posts),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(target: "content", error = ?e, "label mining failed");
                BTreeMap::new()
            }
        }
    }
}

/// Build the retrieval path described by `settings`.
pub fn build_retrieval(settings: &ContentSettings) -> Result<(Retrieval, Option<DynStrategy>)> {
    fn feed_url(settings: &ContentSettings) -> Result<&str> {
        match settings.feed_url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => Ok(u),
            _ => bail!("content kind {:?} requires feed_url", settings.kind),
        }
    }

    Ok(match settings.kind {
        ContentSourceKind::Chain => {
            let direct: DynStrategy =
                Arc::new(providers::direct::DirectApiStrategy::new(settings.api_root.clone()));
            let mut chain: Vec<DynStrategy> = Vec::with_capacity(2);
            if let Some(url) = settings.function_url.as_deref().filter(|u| !u.trim().is_empty()) {
                let mut managed = providers::managed_fn::ManagedFunctionStrategy::new(url);
                if let Some(token) = settings.function_token.as_deref().filter(|t| !t.is_empty()) {
                    managed = managed.with_auth_token(token);
                }
                chain.push(Arc::new(managed));
            }
            chain.push(direct.clone());
            (Retrieval::Chain(chain), Some(direct))
        }
        ContentSourceKind::Rss => (
            Retrieval::Feed(Arc::new(feeds::rss::RssFeed::from_url(feed_url(settings)?))),
            None,
        ),
        ContentSourceKind::JsonFeed => (
            Retrieval::Feed(Arc::new(feeds::json_feed::JsonFeed::from_url(feed_url(settings)?))),
            None,
        ),
        ContentSourceKind::Proxy => (
            Retrieval::Feed(Arc::new(feeds::proxy::ProxyFeed::new(feed_url(settings)?))),
            None,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_function_only_when_configured() {
        let mut s = ContentSettings::default();
        let (r, miner) = build_retrieval(&s).unwrap();
        assert!(miner.is_some());
        match r {
            Retrieval::Chain(c) => {
                assert_eq!(c.len(), 1);
                assert_eq!(c[0].capability(), Capability::DirectApi);
            }
            Retrieval::Feed(_) => panic!("expected chain"),
        }

        s.function_url = Some("https://fn.example/blog".into());
        let (r, _) = build_retrieval(&s).unwrap();
        match r {
            Retrieval::Chain(c) => {
                let caps: Vec<_> = c.iter().map(|s| s.capability()).collect();
                assert_eq!(caps, [Capability::ManagedFunction, Capability::DirectApi]);
            }
            Retrieval::Feed(_) => panic!("expected chain"),
        }
    }

    #[test]
    fn feed_kinds_need_a_url() {
        let s = ContentSettings {
            kind: ContentSourceKind::Rss,
            ..Default::default()
        };
        assert!(build_retrieval(&s).is_err());

        let s = ContentSettings {
            kind: ContentSourceKind::JsonFeed,
            feed_url: Some("https://blog.example/feed.json".into()),
            ..Default::default()
        };
        let (r, miner) = build_retrieval(&s).unwrap();
        assert!(miner.is_none());
        assert!(matches!(r, Retrieval::Feed(_)));
    }
}
