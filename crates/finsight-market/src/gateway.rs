//! Market data gateway
//!
//! One interface over any `MarketDataProvider`, adding the failure policy the
//! orchestrator relies on: per-call timeouts, bounded exponential backoff for
//! rate limits only, and last-known-value fallback when the upstream is
//! unreachable. `SymbolNotFound` is surfaced immediately and never retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use finsight_core::MarketDatum;

use crate::cache::{CacheKey, LastKnownCache};
use crate::error::{MarketError, Result};
use crate::provider::{DateRange, MarketDataProvider};

/// Gateway failure policy configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximum retries after a rate limit
    pub max_retries: u32,
    /// Initial backoff, doubled per retry
    pub retry_backoff_base: Duration,
    /// Per-call timeout; elapse counts as upstream unavailability
    pub request_timeout: Duration,
    /// Lifetime of last-known values used for outage fallback
    pub cache_ttl: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_base: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Data returned by a gateway call, tagged with how it was obtained
///
/// `stale` is true when the upstream failed and the last-known cached value
/// was served instead; callers surface that as a degraded answer.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// The normalized data points
    pub data: Vec<MarketDatum>,
    /// Whether the data came from the fallback cache
    pub stale: bool,
}

/// Normalizing gateway over an upstream market data provider
pub struct MarketGateway {
    provider: Arc<dyn MarketDataProvider>,
    cache: LastKnownCache,
    config: GatewayConfig,
}

impl MarketGateway {
    /// Create a gateway with the given provider and policy
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: GatewayConfig) -> Self {
        let cache = LastKnownCache::new(config.cache_ttl);
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Current quote for a symbol
    pub async fn quote(&self, symbol: &str) -> Result<Fetched> {
        let provider = Arc::clone(&self.provider);
        self.fetch("quote", symbol, || {
            let provider = Arc::clone(&provider);
            let symbol = symbol.to_string();
            async move { provider.quote(&symbol).await }
        })
        .await
    }

    /// Daily closing series for a symbol, optionally bounded by date range
    pub async fn daily(&self, symbol: &str, range: Option<DateRange>) -> Result<Fetched> {
        let provider = Arc::clone(&self.provider);
        self.fetch("daily", symbol, || {
            let provider = Arc::clone(&provider);
            let symbol = symbol.to_string();
            async move { provider.daily(&symbol, range).await }
        })
        .await
    }

    /// Latest reported and estimated earnings per share for a symbol
    pub async fn earnings(&self, symbol: &str) -> Result<Fetched> {
        let provider = Arc::clone(&self.provider);
        self.fetch("earnings", symbol, || {
            let provider = Arc::clone(&provider);
            let symbol = symbol.to_string();
            async move { provider.earnings(&symbol).await }
        })
        .await
    }

    /// Run a provider call under the gateway's failure policy
    async fn fetch<F, Fut>(&self, operation: &str, symbol: &str, call: F) -> Result<Fetched>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Vec<MarketDatum>>>,
    {
        let key = CacheKey::new(symbol, operation);
        let mut attempt: u32 = 0;

        loop {
            let outcome = match tokio::time::timeout(self.config.request_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(MarketError::Upstream(format!(
                    "{operation} for {symbol} timed out"
                ))),
            };

            match outcome {
                Ok(data) => {
                    self.cache.insert(key, data.clone()).await;
                    return Ok(Fetched { data, stale: false });
                }
                Err(MarketError::RateLimited { provider }) if attempt < self.config.max_retries => {
                    let backoff = self.config.retry_backoff_base * 2u32.pow(attempt);
                    attempt += 1;
                    debug!(
                        symbol,
                        operation,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        provider,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err @ MarketError::RateLimited { .. })
                | Err(err @ MarketError::SymbolNotFound(_)) => {
                    // Exhausted retries, or a non-retryable miss
                    return Err(err);
                }
                Err(err) => {
                    // Upstream outage: serve the last-known value if we have one
                    if let Some(cached) = self.cache.get(&key).await {
                        warn!(
                            symbol,
                            operation,
                            error = %err,
                            "upstream unavailable, serving last-known value"
                        );
                        return Ok(Fetched {
                            data: cached,
                            stale: true,
                        });
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Provider name behind this gateway
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
