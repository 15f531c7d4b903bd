//! Page driver: issue one navigation and resolve with the first response whose
//! resource kind is a document. Any other resource kind is rejected.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::DriverError;

/// Coarse classification of a loaded resource, derived from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    Other,
}

impl ResourceKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            // A navigation without a declared type is still the document.
            "" => ResourceKind::Document,
            "text/html" | "application/xhtml+xml" | "application/json" | "text/json"
            | "text/plain" => ResourceKind::Document,
            m if m.starts_with("application/") && m.ends_with("+json") => ResourceKind::Document,
            "text/css" => ResourceKind::Stylesheet,
            "application/javascript" | "text/javascript" | "application/ecmascript" => {
                ResourceKind::Script
            }
            m if m.starts_with("image/") => ResourceKind::Image,
            m if m.starts_with("font/") || m.starts_with("application/font-") => ResourceKind::Font,
            m if m.starts_with("audio/") || m.starts_with("video/") => ResourceKind::Media,
            _ => ResourceKind::Other,
        }
    }

    /// Only documents pass the request filter.
    pub fn is_allowed(self) -> bool {
        matches!(self, ResourceKind::Document)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Document => "document",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Script => "script",
            ResourceKind::Image => "image",
            ResourceKind::Font => "font",
            ResourceKind::Media => "media",
            ResourceKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// The response a navigation resolved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Document {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` once and return the document response.
    async fn open(&self, url: &Url) -> Result<Document, DriverError>;
    fn name(&self) -> &'static str;
}

/// Production driver over `reqwest`, sending the headers a browser navigation
/// would. One attempt per call, client default timeouts.
pub struct HttpPageDriver {
    client: reqwest::Client,
}

impl HttpPageDriver {
    pub fn new(user_agent: &str) -> Result<Self, DriverError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn open(&self, url: &Url) -> Result<Document, DriverError> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DriverError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let kind = content_type
            .as_deref()
            .map(ResourceKind::from_content_type)
            .unwrap_or(ResourceKind::Document);
        if !kind.is_allowed() {
            tracing::debug!(target: "http", url = %url, %kind, "aborting non-document response");
            return Err(DriverError::Blocked {
                url: url.to_string(),
                kind,
            });
        }

        let body = resp.text().await?;
        Ok(Document {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
