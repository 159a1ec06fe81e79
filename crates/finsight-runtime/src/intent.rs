//! Query intent classification
//!
//! Keyword-based routing: cheap, deterministic, and good enough to decide
//! which capabilities a query needs. A query that matches nothing falls
//! through to `Unknown`, which gathers both evidence and market data rather
//! than guessing.

use std::collections::HashSet;

use finsight_core::MetricKind;

/// What the user appears to be asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryIntent {
    /// Current price or quote for a symbol
    PriceLookup,
    /// Price behavior over a past window
    HistoricalPerformance,
    /// Latest earnings vs. estimates
    EarningsQuery,
    /// Volatility, exposure, or portfolio risk
    RiskQuery,
    /// Conceptual question answerable from the document corpus
    GeneralQa,
    /// Nothing matched; gather broadly
    Unknown,
}

/// Keywords for intent classification
mod keywords {
    pub const PRICE: &[&str] = &[
        "price",
        "quote",
        "trading at",
        "current",
        "latest",
        "worth",
        "how much",
        "cost",
    ];

    pub const HISTORICAL: &[&str] = &[
        "historical",
        "performance",
        "past",
        "over the last",
        "history",
        "trend",
        "ytd",
    ];

    pub const EARNINGS: &[&str] = &[
        "earnings",
        "eps",
        "surprise",
        "beat",
        "missed",
        "estimate",
        "quarterly",
    ];

    pub const RISK: &[&str] = &[
        "risk",
        "volatility",
        "exposure",
        "returns",
        "portfolio",
        "allocation",
        "drawdown",
    ];

    pub const GENERAL: &[&str] = &[
        "what is",
        "what are",
        "explain",
        "define",
        "tell me about",
        "how does",
        "why",
    ];
}

/// Result of routing a query
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// The detected intent
    pub intent: QueryIntent,
    /// Ticker symbols mentioned in the query
    pub symbols: Vec<String>,
    /// Metrics the intent calls for
    pub metrics: Vec<MetricKind>,
}

/// Classifies queries and extracts the symbols they mention
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentRouter;

impl IntentRouter {
    /// Create a router
    pub fn new() -> Self {
        Self
    }

    /// Classify the intent of a query
    pub fn classify(&self, query: &str) -> QueryIntent {
        let query = query.to_lowercase();
        let intents = Self::detect_all_intents(&query);

        // Priority order: the more specific data needs win over GeneralQa
        for intent in [
            QueryIntent::RiskQuery,
            QueryIntent::EarningsQuery,
            QueryIntent::HistoricalPerformance,
            QueryIntent::PriceLookup,
            QueryIntent::GeneralQa,
        ] {
            if intents.contains(&intent) {
                return intent;
            }
        }
        QueryIntent::Unknown
    }

    fn detect_all_intents(query: &str) -> HashSet<QueryIntent> {
        let mut intents = HashSet::new();

        if Self::matches_any(query, keywords::PRICE) {
            intents.insert(QueryIntent::PriceLookup);
        }
        if Self::matches_any(query, keywords::HISTORICAL) {
            intents.insert(QueryIntent::HistoricalPerformance);
        }
        if Self::matches_any(query, keywords::EARNINGS) {
            intents.insert(QueryIntent::EarningsQuery);
        }
        if Self::matches_any(query, keywords::RISK) {
            intents.insert(QueryIntent::RiskQuery);
        }
        if Self::matches_any(query, keywords::GENERAL) {
            intents.insert(QueryIntent::GeneralQa);
        }

        intents
    }

    fn matches_any(query: &str, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| query.contains(kw))
    }

    /// Extract ticker symbols from a query
    ///
    /// A symbol is one to five consecutive uppercase ASCII letters standing
    /// alone once punctuation is stripped, e.g. "AAPL" in "What's AAPL's
    /// price?".
    pub fn extract_symbols(&self, query: &str) -> Vec<String> {
        let mut symbols: Vec<String> = query
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| {
                (1..=5).contains(&w.len()) && w.chars().all(|c| c.is_ascii_uppercase())
            })
            .filter(|w| !STOPWORDS.contains(w))
            .map(str::to_string)
            .collect();

        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// Metrics worth computing for the detected intent
    ///
    /// Exposure is added whenever the query asks about it explicitly, since
    /// it cuts across the other intents.
    pub fn requested_metrics(&self, intent: QueryIntent, query: &str) -> Vec<MetricKind> {
        let mut metrics = match intent {
            QueryIntent::RiskQuery => vec![
                MetricKind::AvgDailyReturnPct,
                MetricKind::AnnualizedVolatilityPct,
                MetricKind::RiskDelta,
            ],
            QueryIntent::HistoricalPerformance => vec![
                MetricKind::AvgDailyReturnPct,
                MetricKind::AnnualizedVolatilityPct,
            ],
            QueryIntent::EarningsQuery => vec![MetricKind::EarningsSurprisePct],
            QueryIntent::PriceLookup | QueryIntent::GeneralQa | QueryIntent::Unknown => vec![],
        };

        if query.to_lowercase().contains("exposure") && !metrics.contains(&MetricKind::ExposurePct)
        {
            metrics.push(MetricKind::ExposurePct);
        }
        metrics
    }

    /// Route a query and return the full decision
    pub fn route(&self, query: &str) -> RoutingDecision {
        let intent = self.classify(query);
        let symbols = self.extract_symbols(query);
        let metrics = self.requested_metrics(intent, query);

        RoutingDecision {
            intent,
            symbols,
            metrics,
        }
    }
}

/// Uppercase words that are never ticker symbols in practice
const STOPWORDS: &[&str] = &["A", "I", "OK", "US", "USD", "ETF", "IPO", "CEO", "Q", "FY"];
