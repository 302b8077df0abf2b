// src/content/feeds/proxy.rs
//! Passthrough to a proxy server that already speaks the common post shape.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::FeedSource;
use crate::content::types::{ContentPost, PageQuery, PostPage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyResponse {
    posts: Option<Vec<ContentPost>>,
    #[serde(default)]
    total_pages: Option<u32>,
}

pub struct ProxyFeed {
    url: String,
    client: reqwest::Client,
}

impl ProxyFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn parse_page(body: &str) -> Result<PostPage> {
        let resp: ProxyResponse = serde_json::from_str(body).context("parsing proxy response")?;
        let posts = resp
            .posts
            .ok_or_else(|| anyhow!("proxy response has no posts field"))?;
        Ok(PostPage {
            posts,
            total_pages: resp.total_pages.unwrap_or(0),
        })
    }
}

#[async_trait]
impl FeedSource for ProxyFeed {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PostPage> {
        let page = query.page.to_string();
        let per_page = query.page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![("page", page.as_str()), ("perPage", per_page.as_str())];
        if let Some(label) = query.label.as_deref() {
            params.push(("label", label));
        }
        let body = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .context("proxy get()")?
            .error_for_status()
            .context("proxy status")?
            .text()
            .await
            .context("proxy .text()")?;
        Self::parse_page(&body)
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
