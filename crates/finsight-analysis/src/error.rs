//! Error types for analysis operations

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors from metric computation
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The metric is not in the supported set, or the supplied inputs
    /// cannot produce it
    #[error("unsupported metric {metric}: {reason}")]
    Unsupported { metric: String, reason: String },
}

impl AnalysisError {
    /// Shorthand constructor
    pub fn unsupported(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            metric: metric.into(),
            reason: reason.into(),
        }
    }
}

/// Convert into the orchestration-level taxonomy
impl From<AnalysisError> for finsight_core::Error {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Unsupported { metric, reason } => {
                finsight_core::Error::UnsupportedMetric(format!("{metric} ({reason})"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_taxonomy() {
        let err: finsight_core::Error =
            AnalysisError::unsupported("sharpe_ratio", "not in supported set").into();
        assert!(matches!(err, finsight_core::Error::UnsupportedMetric(_)));
    }
}
