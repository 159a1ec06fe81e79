//! Market data provider trait

use async_trait::async_trait;
use chrono::NaiveDate;

use finsight_core::MarketDatum;

use crate::error::Result;

/// Inclusive date range for historical queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, swapping the bounds if given backwards
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether the date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Trait for upstream market data providers
///
/// Implementations normalize their provider's response schema into
/// `MarketDatum` values; the gateway layers retry, timeout, and fallback
/// policy on top.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the current quote (price and change) for a symbol
    async fn quote(&self, symbol: &str) -> Result<Vec<MarketDatum>>;

    /// Fetch daily closing prices, optionally bounded to a date range
    async fn daily(&self, symbol: &str, range: Option<DateRange>) -> Result<Vec<MarketDatum>>;

    /// Fetch the most recent reported and estimated earnings per share
    async fn earnings(&self, symbol: &str) -> Result<Vec<MarketDatum>>;

    /// Provider name for logging and provenance
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_swaps_backwards_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let range = DateRange::new(b, a);
        assert_eq!(range.start, a);
        assert_eq!(range.end, b);
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );

        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }
}
