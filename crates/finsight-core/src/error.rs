//! Orchestration-level error taxonomy
//!
//! Every sub-call failure the orchestrator can observe maps into one of these
//! variants. All of them are recoverable via the degraded branch; only
//! `RateLimited` is ever retried.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for finsight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds observed by the orchestrator
#[derive(Error, Debug)]
pub enum Error {
    /// The document index backing store could not be opened or is closed
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Upstream market data provider throttled the request
    #[error("rate limited by {provider}")]
    RateLimited {
        provider: String,
        /// Suggested wait before the next attempt, when the provider gave one
        retry_after: Option<Duration>,
    },

    /// The requested symbol does not exist upstream (non-retryable)
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// Upstream market data provider is unreachable or timed out
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The requested metric is not in the supported set, or cannot be
    /// computed from the supplied inputs
    #[error("unsupported metric: {0}")]
    UnsupportedMetric(String),

    /// The generation provider is unreachable, throttled, or timed out
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// No retrieved chunk cleared the similarity threshold
    #[error("no relevant evidence found")]
    NoRelevantEvidence,

    /// Unexpected internal state (never surfaced to callers as-is)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the orchestrator may retry the failed call
    ///
    /// Only rate limits are retried, with bounded exponential backoff.
    /// Everything else falls back immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limited_is_retryable() {
        let err = Error::RateLimited {
            provider: "alpha-vantage".to_string(),
            retry_after: Some(Duration::from_secs(60)),
        };
        assert!(err.is_retryable());

        assert!(!Error::SymbolNotFound("ZZZZ".to_string()).is_retryable());
        assert!(!Error::NoRelevantEvidence.is_retryable());
        assert!(!Error::IndexUnavailable("closed".to_string()).is_retryable());
        assert!(!Error::GenerationUnavailable("outage".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::SymbolNotFound("ZZZZ".to_string());
        assert_eq!(err.to_string(), "symbol not found: ZZZZ");

        let err = Error::RateLimited {
            provider: "alpha-vantage".to_string(),
            retry_after: None,
        };
        assert_eq!(err.to_string(), "rate limited by alpha-vantage");
    }
}
