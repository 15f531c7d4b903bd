// src/cache.rs
//! Item memoization keyed by the record's raw link/slug.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::NormalizeError;
use crate::ingest::types::FeedItem;

#[async_trait]
pub trait ItemCache: Send + Sync {
    /// Return the cached item for `key`, or run `init`, store its result and
    /// return it. Failures are not cached.
    async fn get_or_try_insert<'a>(
        &'a self,
        key: String,
        init: BoxFuture<'a, Result<FeedItem, NormalizeError>>,
    ) -> Result<Arc<FeedItem>, NormalizeError>;
}

/// In-process cache over `moka`. Concurrent callers of one key share a single
/// `init` run; hits hand back the same `Arc`.
#[derive(Clone)]
pub struct MokaItemCache {
    inner: moka::future::Cache<String, Arc<FeedItem>>,
}

impl MokaItemCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = moka::future::Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    #[cfg(test)]
    async fn get(&self, key: &str) -> Option<Arc<FeedItem>> {
        self.inner.get(key).await
    }
}

#[async_trait]
impl ItemCache for MokaItemCache {
    async fn get_or_try_insert<'a>(
        &'a self,
        key: String,
        init: BoxFuture<'a, Result<FeedItem, NormalizeError>>,
    ) -> Result<Arc<FeedItem>, NormalizeError> {
        self.inner
            .try_get_with(key, async move { init.await.map(Arc::new) })
            .await
            .map_err(|e| NormalizeError::clone(&e))
    }
}

/// Pass-through used when caching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopItemCache;

#[async_trait]
impl ItemCache for NoopItemCache {
    async fn get_or_try_insert<'a>(
        &'a self,
        _key: String,
        init: BoxFuture<'a, Result<FeedItem, NormalizeError>>,
    ) -> Result<Arc<FeedItem>, NormalizeError> {
        init.await.map(Arc::new)
    }
}
