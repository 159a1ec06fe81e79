//! Built-in bootstrap corpus
//!
//! Used to seed the index when no documents have been ingested yet, so
//! general-knowledge queries have something to retrieve against out of the
//! box.

/// Financial explainer documents for bootstrapping an empty index
pub const SEED_DOCUMENTS: &[&str] = &[
    "Federated learning trains a model across decentralized devices or servers \
     holding local data samples, without exchanging the raw data itself. In \
     finance it lets institutions collaborate on fraud or credit models while \
     keeping customer records private.",
    "Blockchain technology is a decentralized, distributed ledger that records \
     transactions across many computers so that the record cannot be altered \
     retroactively without altering all subsequent blocks.",
    "Quantum computing in finance is an emerging field exploring portfolio \
     optimization, derivative pricing, and risk simulation workloads that are \
     intractable for classical hardware at scale.",
    "The Efficient Market Hypothesis holds that financial markets are \
     informationally efficient: asset prices reflect all available \
     information, so consistently beating the market through analysis of \
     public data is not possible.",
    "Algorithmic trading uses computer programs to execute trades according to \
     predefined rules on timing, price, and volume, removing human latency and \
     emotion from order execution.",
    "Risk management in finance involves identifying, analyzing, and \
     mitigating financial risks, including market risk, credit risk, \
     liquidity risk, and operational risk.",
    "ESG investing applies environmental, social, and governance standards to \
     screen and weight investments, alongside traditional financial metrics.",
    "Diversification minimizes risk by spreading investment across a variety \
     of assets, so a decline in any single holding has limited effect on the \
     whole portfolio.",
];

/// Seed documents as owned strings, ready for `VectorIndex::ingest`
pub fn seed_corpus() -> Vec<String> {
    SEED_DOCUMENTS.iter().map(|d| (*d).to_string()).collect()
}
