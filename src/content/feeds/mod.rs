// src/content/feeds/mod.rs
//! Standalone adapters. Chosen explicitly through configuration, never tried as
//! part of the automatic strategy chain.

pub mod json_feed;
pub mod proxy;
pub mod rss;

use anyhow::Result;
use async_trait::async_trait;

use crate::content::types::{total_pages, ContentPost, PageQuery, PostPage};

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// One page of posts. Malformed feeds are an error.
    async fn fetch_page(&self, query: &PageQuery) -> Result<PostPage>;
    fn name(&self) -> &'static str;
}

/// Label filter + slicing for feeds that deliver everything at once.
pub fn paginate_locally(posts: Vec<ContentPost>, query: &PageQuery) -> PostPage {
    let filtered: Vec<ContentPost> = match query.label.as_deref() {
        Some(label) => posts
            .into_iter()
            .filter(|p| {
                p.labels
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(label))
            })
            .collect(),
        None => posts,
    };
    let total = filtered.len() as u64;
    let skip = usize::try_from(query.start_index() - 1).unwrap_or(usize::MAX);
    PostPage {
        posts: filtered
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .collect(),
        total_pages: total_pages(Some(total), query.page_size),
    }
}
