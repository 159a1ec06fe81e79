//! Error types for generation operations

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when calling the generation provider
#[derive(Error, Debug)]
pub enum LlmError {
    /// API request failed with a provider error
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response did not match the expected shape
    #[error("unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Prompt template rendering failed
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convert into the orchestration-level taxonomy
///
/// Every provider-side failure means the narrator cannot produce text, which
/// is exactly the `GenerationUnavailable` fallback trigger.
impl From<LlmError> for finsight_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Config(msg) => finsight_core::Error::Internal(msg),
            other => finsight_core::Error::GenerationUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_taxonomy() {
        let err: finsight_core::Error =
            LlmError::RequestFailed("503 from provider".to_string()).into();
        assert!(matches!(
            err,
            finsight_core::Error::GenerationUnavailable(_)
        ));

        let err: finsight_core::Error = LlmError::Config("no api key".to_string()).into();
        assert!(matches!(err, finsight_core::Error::Internal(_)));
    }
}
