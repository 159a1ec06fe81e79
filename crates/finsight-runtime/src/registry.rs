//! Capability registry
//!
//! Maps each query intent to the capabilities the orchestrator should invoke
//! for it. The mapping is explicit data rather than branching inside the
//! orchestrator, so adding an intent or rewiring one is a registry edit, not
//! a state-machine change.

use std::collections::HashMap;

use crate::intent::QueryIntent;

/// A gathering or processing step the orchestrator can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Query the document index for evidence
    Retrieve,
    /// Fetch current quotes from the market gateway
    Quotes,
    /// Fetch daily close history from the market gateway
    History,
    /// Fetch latest earnings figures from the market gateway
    Earnings,
    /// Run the analyzer over gathered inputs
    Analyze,
}

/// Intent-to-capability mapping
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    entries: HashMap<QueryIntent, Vec<Capability>>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        use Capability::{Analyze, Earnings, History, Quotes, Retrieve};

        let mut entries = HashMap::new();
        // Price lookups answer from live data alone; no evidence needed
        entries.insert(QueryIntent::PriceLookup, vec![Quotes]);
        entries.insert(
            QueryIntent::HistoricalPerformance,
            vec![Retrieve, History, Analyze],
        );
        entries.insert(
            QueryIntent::EarningsQuery,
            vec![Retrieve, Quotes, Earnings, Analyze],
        );
        entries.insert(
            QueryIntent::RiskQuery,
            vec![Retrieve, Quotes, History, Analyze],
        );
        entries.insert(QueryIntent::GeneralQa, vec![Retrieve]);
        // Unclassified queries gather broadly and let narration sort it out
        entries.insert(QueryIntent::Unknown, vec![Retrieve, Quotes]);

        Self { entries }
    }
}

impl CapabilityRegistry {
    /// The default mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capabilities registered for an intent
    pub fn register(&mut self, intent: QueryIntent, capabilities: Vec<Capability>) {
        self.entries.insert(intent, capabilities);
    }

    /// Capabilities to invoke for an intent
    pub fn capabilities_for(&self, intent: QueryIntent) -> &[Capability] {
        self.entries.get(&intent).map_or(&[], Vec::as_slice)
    }

    /// Whether the intent invokes the given capability
    pub fn has(&self, intent: QueryIntent, capability: Capability) -> bool {
        self.capabilities_for(intent).contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_lookup_skips_retrieval() {
        let registry = CapabilityRegistry::new();
        assert!(!registry.has(QueryIntent::PriceLookup, Capability::Retrieve));
        assert!(registry.has(QueryIntent::PriceLookup, Capability::Quotes));
    }

    #[test]
    fn test_general_qa_skips_market_data() {
        let registry = CapabilityRegistry::new();
        assert!(registry.has(QueryIntent::GeneralQa, Capability::Retrieve));
        assert!(!registry.has(QueryIntent::GeneralQa, Capability::Quotes));
        assert!(!registry.has(QueryIntent::GeneralQa, Capability::History));
    }

    #[test]
    fn test_risk_query_gathers_everything_but_earnings() {
        let registry = CapabilityRegistry::new();
        assert!(registry.has(QueryIntent::RiskQuery, Capability::Retrieve));
        assert!(registry.has(QueryIntent::RiskQuery, Capability::History));
        assert!(registry.has(QueryIntent::RiskQuery, Capability::Analyze));
        assert!(!registry.has(QueryIntent::RiskQuery, Capability::Earnings));
    }

    #[test]
    fn test_register_overrides_defaults() {
        let mut registry = CapabilityRegistry::new();
        registry.register(QueryIntent::GeneralQa, vec![Capability::Retrieve, Capability::Quotes]);
        assert!(registry.has(QueryIntent::GeneralQa, Capability::Quotes));
    }

    #[test]
    fn test_unknown_intent_gathers_broadly() {
        let registry = CapabilityRegistry::new();
        assert!(registry.has(QueryIntent::Unknown, Capability::Retrieve));
        assert!(registry.has(QueryIntent::Unknown, Capability::Quotes));
    }
}
