// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::geo::Coordinates;

pub const ENV_CONFIG_PATH: &str = "MARKETPLACE_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/marketplace.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/marketplace.json";

const ENV_RADIUS_KM: &str = "PROXIMITY_RADIUS_KM";
const ENV_BLOG_API_KEY: &str = "BLOG_API_KEY";
const ENV_STORE_API_KEY: &str = "STORE_API_KEY";
const ENV_FUNCTION_TOKEN: &str = "FUNCTION_AUTH_TOKEN";

fn default_radius_km() -> Option<f64> {
    Some(500.0)
}
fn default_geolocation_timeout_ms() -> u64 {
    5_000
}
fn default_api_root() -> String {
    "https://www.googleapis.com/blogger/v3/blogs".to_string()
}
fn default_page_size() -> u32 {
    10
}
fn default_label_mining_page_size() -> u32 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NamedPoint {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl Default for NamedPoint {
    fn default() -> Self {
        Self {
            name: "Delhi".to_string(),
            latitude: 28.6139,
            longitude: 77.2090,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximitySettings {
    /// Soft radius in km; `None` (or 0 in a config file) disables it.
    #[serde(default = "default_radius_km")]
    pub radius_km: Option<f64>,
    #[serde(default = "default_geolocation_timeout_ms")]
    pub geolocation_timeout_ms: u64,
    /// Reference point for the last fallback tier.
    #[serde(default)]
    pub default_city: NamedPoint,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            radius_km: default_radius_km(),
            geolocation_timeout_ms: default_geolocation_timeout_ms(),
            default_city: NamedPoint::default(),
        }
    }
}

/// Which retrieval path the blog section uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSourceKind {
    /// Managed function, then direct API.
    #[default]
    Chain,
    Rss,
    JsonFeed,
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSettings {
    #[serde(default)]
    pub kind: ContentSourceKind,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    /// Backend function endpoint; the managed strategy is skipped when absent.
    #[serde(default)]
    pub function_url: Option<String>,
    /// Bearer token for the function; "ENV" means: read from FUNCTION_AUTH_TOKEN
    #[serde(default)]
    pub function_token: Option<String>,
    /// Feed or proxy URL for the standalone adapters.
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Built-in source used until (or instead of) the admin-managed one.
    #[serde(default)]
    pub default_blog_id: String,
    #[serde(default)]
    pub default_api_key: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Size of the one-off label-only fetch, at most 50.
    #[serde(default = "default_label_mining_page_size")]
    pub label_mining_page_size: u32,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            kind: ContentSourceKind::default(),
            api_root: default_api_root(),
            function_url: None,
            function_token: None,
            feed_url: None,
            default_blog_id: String::new(),
            default_api_key: String::new(),
            default_page_size: default_page_size(),
            label_mining_page_size: default_label_mining_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Base URL of the REST store; the in-memory store is used when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    /// "ENV" means: read from STORE_API_KEY
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proximity: ProximitySettings,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON (by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: AppConfig = if ext == "json" {
            serde_json::from_str(&data).context("parsing json config")?
        } else {
            toml::from_str(&data).context("parsing toml config")?
        };
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $MARKETPLACE_CONFIG_PATH
    /// 2) config/marketplace.toml
    /// 3) config/marketplace.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        AppConfig::default().finish()
    }

    /// Apply env overrides, resolve "ENV" keys and sanitize ranges.
    fn finish(mut self) -> Result<Self> {
        if let Some(r) = env::var(ENV_RADIUS_KM)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
        {
            self.proximity.radius_km = Some(r);
        }
        if let Ok(k) = env::var(ENV_BLOG_API_KEY) {
            if !k.trim().is_empty() {
                self.content.default_api_key = k.trim().to_string();
            }
        }
        if self
            .content
            .function_token
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("env"))
        {
            self.content.function_token = Some(
                env::var(ENV_FUNCTION_TOKEN)
                    .map_err(|_| anyhow!("Missing {ENV_FUNCTION_TOKEN} env var"))?,
            );
        }
        if self.store.api_key.trim().eq_ignore_ascii_case("env") {
            self.store.api_key = env::var(ENV_STORE_API_KEY)
                .map_err(|_| anyhow!("Missing {ENV_STORE_API_KEY} env var"))?;
        }

        // Sanitize
        self.proximity.radius_km = self
            .proximity
            .radius_km
            .filter(|r| r.is_finite() && *r > 0.0);
        if self.proximity.geolocation_timeout_ms == 0 {
            self.proximity.geolocation_timeout_ms = default_geolocation_timeout_ms();
        }
        if !self.proximity.default_city.coordinates().is_valid() {
            self.proximity.default_city = NamedPoint::default();
        }
        self.content.default_page_size = self.content.default_page_size.clamp(1, 500);
        self.content.label_mining_page_size = self.content.label_mining_page_size.clamp(1, 50);
        self.content.api_root = self.content.api_root.trim_end_matches('/').to_string();

        Ok(self)
    }
}
