//! Gemini provider implementation
//!
//! Implements both text generation (`GenerationProvider`) and query/document
//! embedding (`finsight_index::Embedder`) over the Generative Language REST
//! API. See: <https://ai.google.dev/api/generate-content>

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::provider::{Generation, GenerationProvider, GenerationRequest};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
const EMBEDDING_DIMENSIONS: usize = 768;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Confidence reported when the provider gives no log-probability signal
const DEFAULT_CONFIDENCE: f32 = 0.75;

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL, overridable for proxies and test servers
    pub api_base: String,
    /// Generation model identifier
    pub model: String,
    /// Embedding model identifier
    pub embedding_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from the GEMINI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LlmError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the generation model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(LlmError::Http)
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
    #[serde(rename = "avgLogprobs")]
    avg_logprobs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini text generation provider
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a provider with the given configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Create a provider from environment configuration
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        );

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
            },
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if let Some(temperature) = request.temperature {
            body["generationConfig"]["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!("{status}: {detail}")));
        }

        let parsed: GenerateResponse = response.json().await?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::UnexpectedResponse("no candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        if text.is_empty() {
            return Err(LlmError::UnexpectedResponse(
                "candidate contained no text".to_string(),
            ));
        }

        // Mean token log-probability, when reported, is the closest thing the
        // API gives to a calibrated confidence
        let confidence = candidate
            .avg_logprobs
            .map(|lp| (lp.exp() as f32).clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE);

        debug!(model = %self.config.model, confidence, "generation complete");
        Ok(Generation { text, confidence })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding provider for the document index
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Client,
    config: GeminiConfig,
}

impl GeminiEmbedder {
    /// Create an embedder with the given configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Create an embedder from environment configuration
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }
}

#[async_trait]
impl finsight_index::Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> finsight_index::Result<Vec<f32>> {
        let url = format!(
            "{}/{}:embedContent",
            self.config.api_base, self.config.embedding_model
        );
        let body = json!({
            "model": self.config.embedding_model,
            "content": { "parts": [{ "text": text }] },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| finsight_index::IndexError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(finsight_index::IndexError::Embedding(format!(
                "embedding request failed: {status}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| finsight_index::IndexError::Embedding(e.to_string()))?;
        Ok(parsed.embedding.values)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn name(&self) -> &str {
        "gemini-embedding"
    }
}
