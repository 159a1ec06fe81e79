//! Deterministic financial metric computation
//!
//! The analyzer is a pure function over retrieved evidence and market data:
//! no external calls, identical output for identical input. The supported
//! metric set is closed; anything else fails with `UnsupportedMetric` rather
//! than silently returning zero.

pub mod analyzer;
pub mod error;
mod series;

pub use analyzer::Analyzer;
pub use error::{AnalysisError, Result};
