//! Error types for index and retrieval operations

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors from the document index and retriever
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing store is closed or its lock is poisoned
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// The embedding provider failed for the given text
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// No retrieved chunk cleared the similarity threshold
    #[error("no relevant evidence cleared the similarity threshold")]
    NoRelevantEvidence,
}

/// Convert into the orchestration-level taxonomy
///
/// An embedding outage leaves the whole retrieval stack unusable, so it maps
/// to `IndexUnavailable` alongside store failures.
impl From<IndexError> for finsight_core::Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Unavailable(msg) => finsight_core::Error::IndexUnavailable(msg),
            IndexError::Embedding(msg) => finsight_core::Error::IndexUnavailable(msg),
            IndexError::NoRelevantEvidence => finsight_core::Error::NoRelevantEvidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_taxonomy() {
        let err: finsight_core::Error = IndexError::NoRelevantEvidence.into();
        assert!(matches!(err, finsight_core::Error::NoRelevantEvidence));

        let err: finsight_core::Error = IndexError::Unavailable("closed".to_string()).into();
        assert!(matches!(err, finsight_core::Error::IndexUnavailable(_)));
    }
}
