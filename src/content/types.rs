// src/content/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub url: String,
}

/// The one post shape every source adapter produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Which blog to read and with which key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSourceConfig {
    pub blog_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    pub label: Option<String>,
}

impl PageQuery {
    /// Page 0 is treated as page 1; page size is at least 1. Blank labels are dropped.
    pub fn new(page: u32, page_size: u32, label: Option<String>) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            label: label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        }
    }

    /// 1-based index of the first item on this page.
    pub fn start_index(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.page_size) + 1
    }
}

/// Posts from one strategy call. `total_pages == 0` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<ContentPost>,
    pub total_pages: u32,
}

/// `ceil(total_items / page_size)`, or 0 when the source reported no total.
pub fn total_pages(total_items: Option<u64>, page_size: u32) -> u32 {
    match total_items {
        Some(n) if page_size > 0 => {
            u32::try_from(n.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}
