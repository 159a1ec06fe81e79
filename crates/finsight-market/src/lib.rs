//! Market data gateway for finsight
//!
//! Normalizes live and historical price queries from upstream providers into
//! the shared `MarketDatum` shape. The gateway retries rate limits with
//! bounded exponential backoff and falls back to last-known cached values
//! when the upstream is unreachable.

pub mod alpha_vantage;
pub mod cache;
pub mod error;
pub mod gateway;
pub mod provider;

pub use alpha_vantage::AlphaVantageProvider;
pub use cache::LastKnownCache;
pub use error::{MarketError, Result};
pub use gateway::{Fetched, GatewayConfig, MarketGateway};
pub use provider::{DateRange, MarketDataProvider};
