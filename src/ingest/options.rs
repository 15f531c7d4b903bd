// src/ingest/options.rs
//! Route options of the form `key1=val1&key2=val2`.

use crate::ingest::types::Language;

pub const LANG_KEY: &str = "lang";
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    pairs: Vec<(String, Option<String>)>,
}

impl RouteOptions {
    /// Value of the first pair named `key`. A bare `key` without `=` has no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pairs.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Split on `&`, then each pair on its first `=`. Values are kept verbatim.
pub fn parse_options(raw: &str) -> RouteOptions {
    let pairs = raw
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.to_string(), Some(v.to_string())),
            None => (p.to_string(), None),
        })
        .collect();
    RouteOptions { pairs }
}

/// Language for this invocation. A missing options string, a missing `lang`
/// key or a valueless `lang` all fall back to `default`.
pub fn resolve_language(raw: Option<&str>, default: &str) -> Language {
    raw.map(parse_options)
        .and_then(|opts| opts.get(LANG_KEY).map(Language::from))
        .unwrap_or_else(|| Language::from(default))
}
