// src/content/providers/managed_fn.rs
//! Backend function strategy: the blog key stays server-side and the function
//! answers with posts already in `ContentPost` shape.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::content::strategy::{Capability, FetchStrategy};
use crate::content::types::{ContentPost, ContentSourceConfig, PageQuery, PostPage};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionRequest<'a> {
    blog_id: &'a str,
    api_key: &'a str,
    page: u32,
    per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_filter: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionResponse {
    #[serde(default)]
    posts: Option<Vec<ContentPost>>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

pub struct ManagedFunctionStrategy {
    url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl ManagedFunctionStrategy {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("kiln-marketplace/0.1")
            .connect_timeout(Duration::from_secs(4))
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            auth_token: None,
            http,
        }
    }

    /// Bearer token for the authenticated function channel.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Success only when there is no error and `posts` is present (an empty array
/// still counts).
fn interpret(resp: FunctionResponse) -> Result<Option<PostPage>> {
    if let Some(err) = resp.error.filter(|e| !e.is_null()) {
        bail!("backend function reported error: {err}");
    }
    Ok(resp.posts.map(|posts| PostPage {
        posts,
        total_pages: resp.total_pages.unwrap_or(0),
    }))
}

#[async_trait]
impl FetchStrategy for ManagedFunctionStrategy {
    fn capability(&self) -> Capability {
        Capability::ManagedFunction
    }

    fn name(&self) -> &'static str {
        "managed_function"
    }

    async fn fetch(
        &self,
        source: &ContentSourceConfig,
        query: &PageQuery,
    ) -> Result<Option<PostPage>> {
        let body = FunctionRequest {
            blog_id: &source.blog_id,
            api_key: &source.api_key,
            page: query.page,
            per_page: query.page_size,
            label_filter: query.label.as_deref(),
        };
        let mut req = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .context("backend function call")?
            .error_for_status()
            .context("backend function status")?;
        let parsed: FunctionResponse = resp.json().await.context("decoding function response")?;
        interpret(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> FunctionResponse {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn empty_posts_is_success() {
        let page = interpret(parse(r#"{"posts": [], "totalPages": 0}"#)).unwrap();
        assert_eq!(page, Some(PostPage::default()));
    }

    #[test]
    fn missing_or_null_posts_is_not_success() {
        assert!(interpret(parse(r#"{"totalPages": 4}"#)).unwrap().is_none());
        assert!(interpret(parse(r#"{"posts": null}"#)).unwrap().is_none());
    }

    #[test]
    fn error_field_fails_even_with_posts() {
        assert!(interpret(parse(r#"{"posts": [], "error": {"message": "quota"}}"#)).is_err());
        assert!(interpret(parse(r#"{"posts": [], "error": null}"#)).is_ok());
    }

    #[test]
    fn request_body_is_camel_case() {
        let v = serde_json::to_value(FunctionRequest {
            blog_id: "b",
            api_key: "k",
            page: 2,
            per_page: 10,
            label_filter: Some("News"),
        })
        .unwrap();
        assert_eq!(v["blogId"], "b");
        assert_eq!(v["perPage"], 10);
        assert_eq!(v["labelFilter"], "News");
    }
}
