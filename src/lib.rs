// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod browser;
pub mod cache;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod render;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{DriverError, FeedError, NormalizeError};
pub use crate::ingest::config::FeedConfig;
pub use crate::ingest::providers::fortnite_news::FortniteNews;
pub use crate::ingest::types::{Feed, FeedItem, Language, SourceRecord};
