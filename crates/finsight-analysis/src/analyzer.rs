//! The analyzer: requested metrics over evidence and market data

use std::collections::BTreeMap;

use tracing::debug;

use finsight_core::{
    AnalysisResult, EvidenceChunk, MarketDatum, MarketField, Metric, MetricKind,
};

use crate::error::{AnalysisError, Result};
use crate::series;

/// Per-symbol view over the market data inputs
#[derive(Debug, Default)]
struct SymbolData {
    closes: Vec<f64>,
    latest_price: Option<f64>,
    eps_actual: Option<f64>,
    eps_estimate: Option<f64>,
}

/// Computes the supported metric set from request inputs
///
/// Stateless and deterministic: the same evidence and market data always
/// produce the same `AnalysisResult`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    /// Create an analyzer
    pub fn new() -> Self {
        Self
    }

    /// Compute the requested metrics
    ///
    /// Fails with `UnsupportedMetric` when a requested metric cannot be
    /// produced from the supplied inputs; it never fabricates a zero.
    pub fn analyze(
        &self,
        evidence: &[EvidenceChunk],
        market: &[MarketDatum],
        requested: &[MetricKind],
    ) -> Result<AnalysisResult> {
        // BTreeMap keeps symbol iteration order deterministic
        let mut by_symbol: BTreeMap<String, SymbolData> = BTreeMap::new();
        for datum in market {
            let entry = by_symbol.entry(datum.symbol.clone()).or_default();
            match datum.field {
                MarketField::Close => entry.closes.push(datum.value),
                MarketField::Price => entry.latest_price = Some(datum.value),
                MarketField::EpsActual => entry.eps_actual = Some(datum.value),
                MarketField::EpsEstimate => entry.eps_estimate = Some(datum.value),
                MarketField::Change => {}
            }
        }

        let mut metrics = Vec::new();
        for kind in requested {
            let computed = match kind {
                MetricKind::ExposurePct => Self::exposure(&by_symbol)?,
                MetricKind::EarningsSurprisePct => Self::earnings_surprise(&by_symbol)?,
                MetricKind::RiskDelta => Self::risk_delta(&by_symbol)?,
                MetricKind::AvgDailyReturnPct => Self::avg_daily_return(&by_symbol)?,
                MetricKind::AnnualizedVolatilityPct => Self::volatility(&by_symbol)?,
            };
            metrics.extend(computed);
        }

        debug!(
            requested = requested.len(),
            produced = metrics.len(),
            symbols = by_symbol.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            metrics,
            evidence_ids: evidence.iter().map(|c| c.id).collect(),
            symbols: by_symbol.into_keys().collect(),
        })
    }

    /// Share of summed latest value held in each symbol
    fn exposure(by_symbol: &BTreeMap<String, SymbolData>) -> Result<Vec<Metric>> {
        let latest: Vec<(&String, f64)> = by_symbol
            .iter()
            .filter_map(|(symbol, data)| {
                data.latest_price
                    .or_else(|| data.closes.last().copied())
                    .map(|value| (symbol, value))
            })
            .collect();

        let total: f64 = latest.iter().map(|(_, v)| v).sum();
        if latest.is_empty() || total == 0.0 {
            return Err(AnalysisError::unsupported(
                "exposure_pct",
                "no priced symbols in inputs",
            ));
        }

        Ok(latest
            .into_iter()
            .map(|(symbol, value)| Metric {
                kind: MetricKind::ExposurePct,
                symbol: Some(symbol.clone()),
                value: value / total * 100.0,
            })
            .collect())
    }

    /// Reported vs. estimated EPS, per symbol that has both
    fn earnings_surprise(by_symbol: &BTreeMap<String, SymbolData>) -> Result<Vec<Metric>> {
        let metrics: Vec<Metric> = by_symbol
            .iter()
            .filter_map(|(symbol, data)| match (data.eps_actual, data.eps_estimate) {
                (Some(actual), Some(estimate)) if estimate != 0.0 => Some(Metric {
                    kind: MetricKind::EarningsSurprisePct,
                    symbol: Some(symbol.clone()),
                    value: (actual - estimate) / estimate.abs() * 100.0,
                }),
                _ => None,
            })
            .collect();

        if metrics.is_empty() {
            return Err(AnalysisError::unsupported(
                "earnings_surprise_pct",
                "no symbol has both reported and estimated EPS",
            ));
        }
        Ok(metrics)
    }

    /// Volatility of the newer half of a series minus the older half
    fn risk_delta(by_symbol: &BTreeMap<String, SymbolData>) -> Result<Vec<Metric>> {
        let metrics: Vec<Metric> = by_symbol
            .iter()
            .filter_map(|(symbol, data)| {
                if data.closes.len() < 6 {
                    return None;
                }
                let mid = data.closes.len() / 2;
                let older = series::annualized_volatility_pct(&data.closes[..mid])?;
                let newer = series::annualized_volatility_pct(&data.closes[mid..])?;
                Some(Metric {
                    kind: MetricKind::RiskDelta,
                    symbol: Some(symbol.clone()),
                    value: newer - older,
                })
            })
            .collect();

        if metrics.is_empty() {
            return Err(AnalysisError::unsupported(
                "risk_delta",
                "no symbol has a long enough close series",
            ));
        }
        Ok(metrics)
    }

    /// Mean daily percent change, per symbol
    fn avg_daily_return(by_symbol: &BTreeMap<String, SymbolData>) -> Result<Vec<Metric>> {
        let metrics: Vec<Metric> = by_symbol
            .iter()
            .filter_map(|(symbol, data)| {
                let returns = series::daily_returns(&data.closes);
                series::mean(&returns).map(|value| Metric {
                    kind: MetricKind::AvgDailyReturnPct,
                    symbol: Some(symbol.clone()),
                    value,
                })
            })
            .collect();

        if metrics.is_empty() {
            return Err(AnalysisError::unsupported(
                "avg_daily_return_pct",
                "no symbol has at least two closes",
            ));
        }
        Ok(metrics)
    }

    /// Annualized volatility, per symbol
    fn volatility(by_symbol: &BTreeMap<String, SymbolData>) -> Result<Vec<Metric>> {
        let metrics: Vec<Metric> = by_symbol
            .iter()
            .filter_map(|(symbol, data)| {
                series::annualized_volatility_pct(&data.closes).map(|value| Metric {
                    kind: MetricKind::AnnualizedVolatilityPct,
                    symbol: Some(symbol.clone()),
                    value,
                })
            })
            .collect();

        if metrics.is_empty() {
            return Err(AnalysisError::unsupported(
                "annualized_volatility_pct",
                "no symbol has at least three closes",
            ));
        }
        Ok(metrics)
    }
}
