// src/ingest/types.rs
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::NormalizeError;

/// Upstream sends `null` for some string fields; treat it like a missing field.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// One raw blog post from the listing API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    /// Full post HTML, images included.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl SourceRecord {
    /// Memoization key: the raw `link` field, or the slug when the link is absent.
    pub fn cache_key(&self) -> &str {
        match self.link.as_deref() {
            Some(link) if !link.is_empty() => link,
            _ => &self.slug,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogListing {
    #[serde(rename = "blogList", default, deserialize_with = "null_as_default")]
    pub blog_list: Vec<SourceRecord>,
}

/// Locale token, kept verbatim as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One normalized feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
    pub author: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub item: Vec<Arc<FeedItem>>,
}

#[async_trait::async_trait]
pub trait ItemNormalizer: Send + Sync {
    async fn normalize(
        &self,
        record: &SourceRecord,
        lang: &Language,
    ) -> Result<FeedItem, NormalizeError>;
}
