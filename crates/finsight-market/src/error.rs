//! Error types for market data operations

use thiserror::Error;

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors from market data providers and the gateway
#[derive(Debug, Error)]
pub enum MarketError {
    /// Provider throttled the request (retryable with backoff)
    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    /// The symbol does not exist upstream (never retried)
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// Provider is unreachable, returned garbage, or timed out
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response parsing error
    #[error("response parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convert into the orchestration-level taxonomy
impl From<MarketError> for finsight_core::Error {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::RateLimited { provider } => finsight_core::Error::RateLimited {
                provider,
                retry_after: None,
            },
            MarketError::SymbolNotFound(symbol) => finsight_core::Error::SymbolNotFound(symbol),
            MarketError::Upstream(msg) => finsight_core::Error::UpstreamUnavailable(msg),
            MarketError::Network(e) => finsight_core::Error::UpstreamUnavailable(e.to_string()),
            MarketError::Json(e) => finsight_core::Error::UpstreamUnavailable(e.to_string()),
            MarketError::Config(msg) => finsight_core::Error::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_taxonomy() {
        let err: finsight_core::Error = MarketError::SymbolNotFound("ZZZZ".to_string()).into();
        assert!(matches!(err, finsight_core::Error::SymbolNotFound(_)));

        let err: finsight_core::Error = MarketError::RateLimited {
            provider: "alpha-vantage".to_string(),
        }
        .into();
        assert!(err.is_retryable());

        let err: finsight_core::Error = MarketError::Upstream("connect refused".to_string()).into();
        assert!(matches!(err, finsight_core::Error::UpstreamUnavailable(_)));
    }
}
