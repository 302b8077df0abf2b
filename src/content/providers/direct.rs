// src/content/providers/direct.rs
//! Direct call to the external blog API (`{apiRoot}/{blogId}/posts`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use crate::content::normalize::{clean_text, extract_image_urls, non_empty, parse_rfc3339};
use crate::content::strategy::{Capability, FetchStrategy};
use crate::content::types::{total_pages, Author, ContentPost, ContentSourceConfig, PageQuery, PostPage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostList {
    #[serde(default)]
    items: Vec<ApiPost>,
    #[serde(default)]
    total_items: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAuthor {
    #[serde(default)]
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: Option<ApiAuthor>,
    #[serde(default)]
    images: Vec<ApiImage>,
    #[serde(default)]
    labels: Vec<String>,
}

impl From<ApiPost> for ContentPost {
    fn from(p: ApiPost) -> Self {
        // Posts without attached images still often embed them in the body.
        let mut images: Vec<String> = p.images.into_iter().map(|i| i.url).collect();
        if images.is_empty() {
            images = extract_image_urls(&p.content);
        }
        let author = p.author.unwrap_or_default();
        ContentPost {
            id: p.id,
            title: clean_text(&p.title),
            published: p.published.as_deref().and_then(parse_rfc3339),
            content: p.content,
            author: Author {
                id: author.id,
                display_name: author.display_name,
                url: author.url,
            },
            images: non_empty(images),
            labels: non_empty(p.labels),
        }
    }
}

/// `{api_root}/{blog_id}/posts?key=..&maxResults=..&startIndex=..[&labels=..]`
pub fn build_posts_url(
    api_root: &str,
    source: &ContentSourceConfig,
    query: &PageQuery,
) -> Result<Url> {
    let base = format!(
        "{}/{}/posts",
        api_root.trim_end_matches('/'),
        source.blog_id
    );
    let max_results = query.page_size.to_string();
    let start_index = query.start_index().to_string();
    let mut params: Vec<(&str, &str)> = vec![
        ("key", source.api_key.as_str()),
        ("maxResults", max_results.as_str()),
        ("startIndex", start_index.as_str()),
    ];
    if let Some(label) = query.label.as_deref() {
        params.push(("labels", label));
    }
    Url::parse_with_params(&base, &params).with_context(|| format!("building posts url from {base}"))
}

pub struct DirectApiStrategy {
    api_root: String,
    http: reqwest::Client,
}

impl DirectApiStrategy {
    pub fn new(api_root: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("kiln-marketplace/0.1")
            .connect_timeout(Duration::from_secs(4))
            .build()
            .unwrap_or_default();
        Self {
            api_root: api_root.into(),
            http,
        }
    }

    async fn get_page(&self, source: &ContentSourceConfig, query: &PageQuery) -> Result<PostPage> {
        let url = build_posts_url(&self.api_root, source, query)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("blog api get()")?
            .error_for_status()
            .context("blog api status")?;
        let list: PostList = resp.json().await.context("decoding blog api response")?;
        Ok(PostPage {
            total_pages: total_pages(list.total_items, query.page_size),
            posts: list.items.into_iter().map(ContentPost::from).collect(),
        })
    }
}

#[async_trait]
impl FetchStrategy for DirectApiStrategy {
    fn capability(&self) -> Capability {
        Capability::DirectApi
    }

    fn name(&self) -> &'static str {
        "direct_api"
    }

    /// Non-2xx and transport errors become an empty page, never an error.
    async fn fetch(
        &self,
        source: &ContentSourceConfig,
        query: &PageQuery,
    ) -> Result<Option<PostPage>> {
        match self.get_page(source, query).await {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                tracing::warn!(target: "content", error = ?e, "direct blog api failed; empty page");
                Ok(Some(PostPage::default()))
            }
        }
    }
}
