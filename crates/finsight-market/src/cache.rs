//! Last-known-value cache for gateway fallback
//!
//! Successful fetches are remembered here so an upstream outage can be
//! answered with the most recent known data instead of nothing. Entries
//! expire on a TTL; a stale-but-present value is still preferable to a
//! degraded answer with no number at all.

use std::sync::Arc;
use std::time::Duration;

use cached::{Cached, TimedCache};
use tokio::sync::RwLock;
use tracing::debug;

use finsight_core::MarketDatum;

/// Cache key: symbol plus operation kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    symbol: String,
    operation: String,
}

impl CacheKey {
    /// Create a key for a symbol/operation pair
    pub fn new(symbol: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            operation: operation.into(),
        }
    }
}

/// Thread-safe cache of the most recent successful fetch per key
pub struct LastKnownCache {
    cache: Arc<RwLock<TimedCache<CacheKey, Vec<MarketDatum>>>>,
}

impl LastKnownCache {
    /// Create a cache with the given entry lifetime
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get the last known value for a key, if still live
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<MarketDatum>> {
        let mut cache = self.cache.write().await;
        let hit = cache.cache_get(key).cloned();
        if hit.is_some() {
            debug!(?key, "last-known cache hit");
        }
        hit
    }

    /// Remember a successful fetch
    pub async fn insert(&self, key: CacheKey, value: Vec<MarketDatum>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Drop all entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for LastKnownCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
