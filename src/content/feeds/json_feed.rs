// src/content/feeds/json_feed.rs
//! JSON Feed (https://jsonfeed.org, v1 and v1.1).

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use super::{paginate_locally, FeedSource};
use crate::content::normalize::{clean_text, extract_image_urls, non_empty, parse_any_timestamp};
use crate::content::types::{Author, ContentPost, PageQuery, PostPage};

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    items: Vec<FeedItem>,
    // v1.0 puts the author on the feed
    #[serde(default)]
    author: Option<FeedAuthor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FeedAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    id: serde_json::Value,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content_html: Option<String>,
    #[serde(default)]
    content_text: Option<String>,
    #[serde(default)]
    date_published: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    authors: Vec<FeedAuthor>,
    #[serde(default)]
    author: Option<FeedAuthor>,
    #[serde(default)]
    tags: Vec<String>,
}

fn into_post(item: FeedItem, feed_author: Option<&FeedAuthor>) -> ContentPost {
    let content = item
        .content_html
        .or_else(|| item.content_text.map(|t| html_escape::encode_text(&t).to_string()))
        .unwrap_or_default();
    let mut images: Vec<String> = item.image.into_iter().collect();
    for u in extract_image_urls(&content) {
        if !images.contains(&u) {
            images.push(u);
        }
    }
    let author = item
        .authors
        .into_iter()
        .next()
        .or(item.author)
        .or_else(|| feed_author.cloned())
        .unwrap_or_default();
    let id = match item.id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    // Items without an author URL still link back to the post itself.
    let author_url = if author.url.is_empty() {
        item.url.unwrap_or_default()
    } else {
        author.url.clone()
    };
    ContentPost {
        id,
        title: clean_text(item.title.as_deref().unwrap_or_default()),
        published: item.date_published.as_deref().and_then(parse_any_timestamp),
        content,
        author: Author {
            id: author.url,
            display_name: author.name,
            url: author_url,
        },
        images: non_empty(images),
        labels: non_empty(item.tags),
    }
}

pub struct JsonFeed {
    mode: Mode,
}

enum Mode {
    Inline(String),
    Http { url: String, client: reqwest::Client },
}

impl JsonFeed {
    pub fn from_json(body: &str) -> Self {
        Self {
            mode: Mode::Inline(body.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn parse_posts(body: &str) -> Result<Vec<ContentPost>> {
        let feed: Feed = serde_json::from_str(body).context("parsing json feed")?;
        let feed_author = feed.author;
        let out: Vec<ContentPost> = feed
            .items
            .into_iter()
            .map(|it| into_post(it, feed_author.as_ref()))
            .collect();
        counter!("content_feed_posts_total", "feed" => "json_feed").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for JsonFeed {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PostPage> {
        let posts = match &self.mode {
            Mode::Inline(s) => Self::parse_posts(s)?,
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("json feed get()")?
                    .error_for_status()
                    .context("json feed status")?
                    .text()
                    .await
                    .context("json feed .text()")?;
                Self::parse_posts(&body)?
            }
        };
        Ok(paginate_locally(posts, query))
    }

    fn name(&self) -> &'static str {
        "json_feed"
    }
}
