//! Alpha Vantage provider implementation

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use tracing::debug;

use finsight_core::{MarketDatum, MarketField};

use crate::error::{MarketError, Result};
use crate::provider::{DateRange, MarketDataProvider};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_NAME: &str = "alpha-vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageProvider {
    /// Create a client with API key and requests-per-minute limit
    ///
    /// The free tier allows 5 requests per minute, which is the fallback if
    /// an invalid limit is given.
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let per_minute = NonZeroU32::new(rate_limit)
            .or(NonZeroU32::new(5))
            .unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            rate_limiter,
        }
    }

    /// Create from the ALPHA_VANTAGE_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            MarketError::Config("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key, 5))
    }

    /// Issue a query and surface provider-level error envelopes
    async fn get(&self, function: &str, symbol: &str) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        let mut params = HashMap::new();
        params.insert("function", function);
        params.insert("symbol", symbol);
        params.insert("apikey", &self.api_key);

        let response = self.client.get(BASE_URL).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(MarketError::Upstream(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;

        if data.get("Error Message").is_some() {
            // Alpha Vantage uses this envelope for unknown symbols and
            // malformed calls alike; with a fixed function set, the symbol
            // is the variable
            return Err(MarketError::SymbolNotFound(symbol.to_string()));
        }
        if data.get("Note").is_some() || data.get("Information").is_some() {
            return Err(MarketError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
            });
        }

        Ok(data)
    }
}

/// Parse a numeric field that Alpha Vantage serializes as a string
fn parse_value(values: &serde_json::Value, key: &str) -> Option<f64> {
    values
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| s.trim_end_matches('%').parse().ok())
}

/// Midnight UTC of a provider-reported trading day
fn trading_day(date: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn quote(&self, symbol: &str) -> Result<Vec<MarketDatum>> {
        let data = self.get("GLOBAL_QUOTE", symbol).await?;

        let quote = data
            .get("Global Quote")
            .and_then(|q| q.as_object())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))?;

        let quote = serde_json::Value::Object(quote.clone());
        let as_of = quote
            .get("07. latest trading day")
            .and_then(|v| v.as_str())
            .map(trading_day)
            .unwrap_or_else(Utc::now);

        let price = parse_value(&quote, "05. price")
            .ok_or_else(|| MarketError::Upstream("quote missing price field".to_string()))?;

        let mut data = vec![MarketDatum {
            symbol: symbol.to_string(),
            field: MarketField::Price,
            value: price,
            as_of,
            source: PROVIDER_NAME.to_string(),
        }];

        if let Some(change) = parse_value(&quote, "09. change") {
            data.push(MarketDatum {
                symbol: symbol.to_string(),
                field: MarketField::Change,
                value: change,
                as_of,
                source: PROVIDER_NAME.to_string(),
            });
        }

        debug!(symbol, price, "normalized quote");
        Ok(data)
    }

    async fn daily(&self, symbol: &str, range: Option<DateRange>) -> Result<Vec<MarketDatum>> {
        let data = self.get("TIME_SERIES_DAILY", symbol).await?;

        let series = data
            .get("Time Series (Daily)")
            .and_then(|s| s.as_object())
            .ok_or_else(|| MarketError::Upstream("no daily series in response".to_string()))?;

        let mut points = Vec::new();
        for (date, values) in series {
            let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                continue;
            };
            if let Some(range) = range {
                if !range.contains(day) {
                    continue;
                }
            }
            if let Some(close) = parse_value(values, "4. close") {
                points.push(MarketDatum {
                    symbol: symbol.to_string(),
                    field: MarketField::Close,
                    value: close,
                    as_of: day.and_time(NaiveTime::MIN).and_utc(),
                    source: PROVIDER_NAME.to_string(),
                });
            }
        }

        // Oldest first, so series math downstream reads naturally
        points.sort_by_key(|d| d.as_of);
        debug!(symbol, points = points.len(), "normalized daily series");
        Ok(points)
    }

    async fn earnings(&self, symbol: &str) -> Result<Vec<MarketDatum>> {
        let data = self.get("EARNINGS", symbol).await?;

        let latest = data
            .get("quarterlyEarnings")
            .and_then(|q| q.as_array())
            .and_then(|quarters| quarters.first())
            .ok_or_else(|| MarketError::Upstream("no quarterly earnings in response".to_string()))?;

        let as_of = latest
            .get("fiscalDateEnding")
            .and_then(|v| v.as_str())
            .map(trading_day)
            .unwrap_or_else(Utc::now);

        let mut points = Vec::new();
        if let Some(actual) = parse_value(latest, "reportedEPS") {
            points.push(MarketDatum {
                symbol: symbol.to_string(),
                field: MarketField::EpsActual,
                value: actual,
                as_of,
                source: PROVIDER_NAME.to_string(),
            });
        }
        if let Some(estimate) = parse_value(latest, "estimatedEPS") {
            points.push(MarketDatum {
                symbol: symbol.to_string(),
                field: MarketField::EpsEstimate,
                value: estimate,
                as_of,
                source: PROVIDER_NAME.to_string(),
            });
        }

        if points.is_empty() {
            return Err(MarketError::Upstream(
                "earnings response missing EPS fields".to_string(),
            ));
        }
        debug!(symbol, points = points.len(), "normalized earnings");
        Ok(points)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let provider = AlphaVantageProvider::new("test_key", 5);
        assert_eq!(provider.api_key, "test_key");
        assert_eq!(provider.name(), "alpha-vantage");
    }

    #[test]
    fn test_parse_value_handles_strings_and_garbage() {
        let values = serde_json::json!({
            "4. close": "150.25",
            "bad": "not a number",
        });
        assert_eq!(parse_value(&values, "4. close"), Some(150.25));
        assert_eq!(parse_value(&values, "bad"), None);
        assert_eq!(parse_value(&values, "missing"), None);
    }

    #[test]
    fn test_trading_day_parses_dates() {
        let ts = trading_day("2024-03-15");
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_live_quote() {
        let provider = AlphaVantageProvider::from_env().unwrap();
        let data = provider.quote("AAPL").await.unwrap();
        assert!(data.iter().any(|d| d.field == MarketField::Price));
    }
}
