//! Request and response data model
//!
//! `Query`, `MarketDatum`, `AnalysisResult`, and `Answer` live for a single
//! request and are owned by its processing context. `EvidenceChunk` values are
//! created by ingestion and read-only afterwards; only an explicit index
//! rebuild evicts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for an evidence chunk in the document index
pub type ChunkId = Uuid;

/// How the query text reached the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Typed text
    #[default]
    Text,
    /// Transcribed speech
    Voice,
    /// Text extracted from an image
    ImageText,
}

/// A user query, immutable once received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Unique request identifier
    pub id: Uuid,
    /// Raw query text
    pub text: String,
    /// Input modality
    pub modality: Modality,
    /// When the query was received
    pub received_at: DateTime<Utc>,
}

impl Query {
    /// Create a new query stamped with the current time
    pub fn new(text: impl Into<String>, modality: Modality) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            modality,
            received_at: Utc::now(),
        }
    }
}

/// An embedded span of ingested document text with retrieval provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    /// Chunk identifier, stable for the lifetime of the index
    pub id: ChunkId,
    /// Identifier of the source document this span was cut from
    pub document_id: String,
    /// The text span itself
    pub text: String,
    /// Embedding vector of the span
    pub embedding: Vec<f32>,
    /// Similarity to the query that retrieved this chunk (0.0-1.0);
    /// zero until the chunk is returned from a search
    pub similarity: f32,
    /// When the chunk was embedded and inserted
    pub retrieved_at: DateTime<Utc>,
}

/// The kind of value a market datum carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketField {
    /// Latest traded price
    Price,
    /// Daily closing price
    Close,
    /// Absolute change since previous close
    Change,
    /// Reported earnings per share
    EpsActual,
    /// Consensus earnings-per-share estimate
    EpsEstimate,
}

impl MarketField {
    /// Human-readable label for answer text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Close => "close",
            Self::Change => "change",
            Self::EpsActual => "reported EPS",
            Self::EpsEstimate => "estimated EPS",
        }
    }
}

/// A normalized market data point, fetched per-request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDatum {
    /// Ticker symbol
    pub symbol: String,
    /// What the value represents
    pub field: MarketField,
    /// The numeric value
    pub value: f64,
    /// Timestamp the value is valid as of
    pub as_of: DateTime<Utc>,
    /// Upstream provider name
    pub source: String,
}

/// Metrics the analyzer knows how to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Share of summed portfolio value held in one symbol
    ExposurePct,
    /// Reported EPS vs. consensus estimate
    EarningsSurprisePct,
    /// Change in volatility between the older and newer half of a series
    RiskDelta,
    /// Mean daily percent change over a price series
    AvgDailyReturnPct,
    /// Standard deviation of daily returns, annualized over 252 trading days
    AnnualizedVolatilityPct,
}

impl MetricKind {
    /// Unit string attached to the metric value
    pub fn unit(&self) -> &'static str {
        match self {
            Self::ExposurePct
            | Self::EarningsSurprisePct
            | Self::AvgDailyReturnPct
            | Self::AnnualizedVolatilityPct => "%",
            Self::RiskDelta => "pp",
        }
    }

    /// Human-readable label for answer text
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExposurePct => "exposure",
            Self::EarningsSurprisePct => "earnings surprise",
            Self::RiskDelta => "risk delta",
            Self::AvgDailyReturnPct => "average daily return",
            Self::AnnualizedVolatilityPct => "annualized volatility",
        }
    }
}

/// A single computed metric value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// Which metric this is
    pub kind: MetricKind,
    /// Symbol the metric refers to, when symbol-scoped
    pub symbol: Option<String>,
    /// Computed value, in the unit given by `kind.unit()`
    pub value: f64,
}

/// Output of the analyzer
///
/// Carries identifiers of its inputs rather than copies, so a result can be
/// traced back to the evidence and market data it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    /// Computed metrics
    pub metrics: Vec<Metric>,
    /// Evidence chunks that fed the computation
    pub evidence_ids: Vec<ChunkId>,
    /// Symbols the market data inputs covered
    pub symbols: Vec<String>,
}

impl AnalysisResult {
    /// Look up a computed metric by kind and optional symbol
    pub fn metric(&self, kind: MetricKind, symbol: Option<&str>) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.kind == kind && m.symbol.as_deref() == symbol)
    }

    /// Whether the analyzer produced anything at all
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// The final response to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text
    pub text: String,
    /// Opaque handle to rendered speech, when a voice front-end asked for it
    pub audio_ref: Option<String>,
    /// Evidence chunks actually consulted for this answer
    pub citations: Vec<ChunkId>,
    /// Confidence in the answer (0.0-1.0)
    pub confidence: f32,
    /// True when any upstream fallback was triggered
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_new() {
        let query = Query::new("What's AAPL's price?", Modality::Text);
        assert_eq!(query.text, "What's AAPL's price?");
        assert_eq!(query.modality, Modality::Text);
    }

    #[test]
    fn test_metric_units() {
        assert_eq!(MetricKind::ExposurePct.unit(), "%");
        assert_eq!(MetricKind::RiskDelta.unit(), "pp");
    }

    #[test]
    fn test_analysis_result_lookup() {
        let result = AnalysisResult {
            metrics: vec![Metric {
                kind: MetricKind::AvgDailyReturnPct,
                symbol: Some("AAPL".to_string()),
                value: 0.42,
            }],
            evidence_ids: vec![],
            symbols: vec!["AAPL".to_string()],
        };

        assert!(
            result
                .metric(MetricKind::AvgDailyReturnPct, Some("AAPL"))
                .is_some()
        );
        assert!(result.metric(MetricKind::RiskDelta, Some("AAPL")).is_none());
        assert!(!result.is_empty());
    }
}
