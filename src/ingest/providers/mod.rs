// src/ingest/providers/mod.rs
pub mod fortnite_news;

use serde::Serialize;

/// Static description of a feed route, as listed by the host.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDescriptor {
    pub namespace: &'static str,
    pub path: &'static str,
    pub name: &'static str,
    pub categories: &'static [&'static str],
    pub example: &'static str,
    pub maintainers: &'static [&'static str],
    pub require_puppeteer: bool,
    pub anti_crawler: bool,
    /// `(key, description)` pairs accepted in the options segment.
    pub parameters: &'static [(&'static str, &'static str)],
    /// `(locale, display name)` pairs known to work with the upstream site.
    pub languages: &'static [(&'static str, &'static str)],
}

impl RouteDescriptor {
    /// Path as mounted on the host, e.g. `/fortnite/news/:options?`.
    pub fn full_path(&self) -> String {
        format!("/{}{}", self.namespace, self.path)
    }
}

pub fn routes() -> Vec<&'static RouteDescriptor> {
    vec![&fortnite_news::ROUTE]
}
