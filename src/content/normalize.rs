// src/content/normalize.rs
//! Helpers shared by the source adapters when mapping into `ContentPost`.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Decode HTML entities, strip tags and collapse whitespace (titles, names).
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let out = re_tags.replace_all(&decoded, "");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// `src` of every `<img>` in an HTML fragment, in document order, deduplicated.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
    });
    let mut out: Vec<String> = Vec::new();
    for cap in re.captures_iter(html) {
        let url = html_escape::decode_html_entities(&cap[1]).to_string();
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

/// `Some(v)` unless `v` is empty, so optional list fields stay absent.
pub fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

pub fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
}

/// Feeds in the wild use both formats.
pub fn parse_any_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    parse_rfc3339(ts).or_else(|| parse_rfc2822(ts))
}

/// Blogger-style RSS authors look like `noreply@blogger.com (Name)`.
pub fn author_name_from_rss(raw: &str) -> String {
    let raw = raw.trim();
    if let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) {
        if open < close {
            return clean_text(&raw[open + 1..close]);
        }
    }
    clean_text(raw)
}
