// src/content/feeds/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::{paginate_locally, FeedSource};
use crate::content::normalize::{
    author_name_from_rss, clean_text, extract_image_urls, non_empty, parse_any_timestamp,
};
use crate::content::types::{Author, ContentPost, PageQuery, PostPage};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

pub struct RssFeed {
    mode: Mode,
}

enum Mode {
    Inline(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeed {
    /// Parse an already-fetched document (fixtures, tests).
    pub fn from_xml(xml: &str) -> Self {
        Self {
            mode: Mode::Inline(xml.to_string()),
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

    pub fn parse_posts(xml: &str) -> Result<Vec<ContentPost>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for (idx, it) in rss.channel.item.into_iter().enumerate() {
            let content = it.description.unwrap_or_default();
            let id = it
                .guid
                .or_else(|| it.link.clone())
                .unwrap_or_else(|| format!("rss-{idx}"));
            let author_name = it.author.as_deref().map(author_name_from_rss).unwrap_or_default();
            let labels: Vec<String> = it
                .categories
                .iter()
                .map(|c| clean_text(c))
                .filter(|c| !c.is_empty())
                .collect();
            out.push(ContentPost {
                id,
                title: clean_text(it.title.as_deref().unwrap_or_default()),
                published: it.pub_date.as_deref().and_then(parse_any_timestamp),
                images: non_empty(extract_image_urls(&content)),
                content,
                author: Author {
                    id: String::new(),
                    display_name: author_name,
                    url: it.link.unwrap_or_default(),
                },
                labels: non_empty(labels),
            });
        }

        histogram!("content_feed_parse_ms", "feed" => "rss")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("content_feed_posts_total", "feed" => "rss").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PostPage> {
        let posts = match &self.mode {
            Mode::Inline(s) => Self::parse_posts(s)?,
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("rss http get()")?
                    .error_for_status()
                    .context("rss http status")?
                    .text()
                    .await
                    .context("rss http .text()")?;
                Self::parse_posts(&body)?
            }
        };
        Ok(paginate_locally(posts, query))
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

/// Named HTML entities that plain XML parsers reject.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
