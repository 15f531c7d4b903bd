// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::ingest::options::DEFAULT_LANGUAGE;

pub const ENV_PATH: &str = "FEED_CONFIG_PATH";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Runtime settings for the feed route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Site root used for feed and item links.
    pub root_url: String,
    /// Origin of the listing API.
    pub api_base: String,
    pub default_language: String,
    pub cache_enabled: bool,
    /// Item memoization lifetime; 3600s matches the content expiry of the feed host.
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            root_url: "https://www.fortnite.com".to_string(),
            api_base: "https://www.fortnite.com".to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            cache_enabled: true,
            cache_ttl_secs: 3600,
            cache_capacity: 10_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FeedConfig {
    pub fn api_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.api_base)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn sanitize(mut self) -> Self {
        self.root_url = self.root_url.trim().trim_end_matches('/').to_string();
        self.api_base = self.api_base.trim().to_string();
        if self.default_language.trim().is_empty() {
            self.default_language = DEFAULT_LANGUAGE.to_string();
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $FEED_CONFIG_PATH
/// 2) config/feed.toml
/// 3) config/feed.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<FeedConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("FEED_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feed.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feed.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(FeedConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    let parsed = match hint_ext {
        "toml" => toml::from_str::<FeedConfig>(s).context("parsing feed config toml")?,
        "json" => serde_json::from_str::<FeedConfig>(s).context("parsing feed config json")?,
        _ => serde_json::from_str::<FeedConfig>(s)
            .or_else(|_| toml::from_str::<FeedConfig>(s))
            .map_err(|_| anyhow!("unsupported feed config format"))?,
    };
    let cfg = parsed.sanitize();
    cfg.api_base_url()
        .with_context(|| format!("api_base `{}` is not a valid url", cfg.api_base))?;
    Ok(cfg)
}
