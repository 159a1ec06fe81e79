//! Grounded answer narration
//!
//! The narrator renders retrieved evidence, market data, and computed metrics
//! into a prompt whose system instruction forbids the model from going beyond
//! the supplied material, then calls the generation provider. It returns both
//! the text and the provider's confidence indicator.

use std::sync::Arc;

use minijinja::{Environment, context};
use tracing::debug;

use finsight_core::{AnalysisResult, EvidenceChunk, MarketDatum, Query};

use crate::error::Result;
use crate::provider::{Generation, GenerationProvider, GenerationRequest};

/// A narrated answer with its confidence indicator
pub type Narration = Generation;

/// Instruction that pins the model to the supplied material
const GROUNDING_INSTRUCTION: &str = "You are a financial assistant. Answer the user's question using \
only the evidence, market data, and computed metrics supplied in the prompt. Do not invent facts, \
figures, or sources. If the supplied material does not answer the question, say so plainly. Keep the \
answer concise.";

const NARRATE_TEMPLATE: &str = r"Question: {{ query }}
{% if evidence %}
Evidence:
{% for chunk in evidence %}- [{{ chunk.document_id }}] {{ chunk.text }}
{% endfor %}{% endif %}{% if market %}
Market data:
{% for datum in market %}- {{ datum.symbol }} {{ datum.field }}: {{ datum.value }} (as of {{ datum.as_of }})
{% endfor %}{% endif %}{% if metrics %}
Computed metrics:
{% for metric in metrics %}- {{ metric.label }}{% if metric.symbol %} for {{ metric.symbol }}{% endif %}: {{ metric.value }} {{ metric.unit }}
{% endfor %}{% endif %}";

/// Narrator generation parameters
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// Maximum tokens for the narrated answer
    pub max_tokens: usize,
    /// Sampling temperature; low, since answers must track the inputs
    pub temperature: f32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.3,
        }
    }
}

/// Turns structured evidence and metrics into a natural-language answer
pub struct Narrator {
    provider: Arc<dyn GenerationProvider>,
    env: Environment<'static>,
    config: NarratorConfig,
}

impl Narrator {
    /// Create a narrator over the given generation provider
    pub fn new(provider: Arc<dyn GenerationProvider>, config: NarratorConfig) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("narrate", NARRATE_TEMPLATE)?;
        Ok(Self {
            provider,
            env,
            config,
        })
    }

    /// Render the grounded prompt for a request
    fn render_prompt(
        &self,
        query: &Query,
        evidence: &[EvidenceChunk],
        market: &[MarketDatum],
        analysis: &AnalysisResult,
    ) -> Result<String> {
        let evidence_ctx: Vec<_> = evidence
            .iter()
            .map(|c| {
                context! {
                    document_id => c.document_id,
                    text => c.text,
                }
            })
            .collect();
        let market_ctx: Vec<_> = market
            .iter()
            .map(|d| {
                context! {
                    symbol => d.symbol,
                    field => d.field.label(),
                    value => format!("{:.2}", d.value),
                    as_of => d.as_of.format("%Y-%m-%d").to_string(),
                }
            })
            .collect();
        let metrics_ctx: Vec<_> = analysis
            .metrics
            .iter()
            .map(|m| {
                context! {
                    label => m.kind.label(),
                    symbol => m.symbol,
                    value => format!("{:.2}", m.value),
                    unit => m.kind.unit(),
                }
            })
            .collect();

        let template = self.env.get_template("narrate")?;
        let prompt = template.render(context! {
            query => query.text,
            evidence => evidence_ctx,
            market => market_ctx,
            metrics => metrics_ctx,
        })?;
        Ok(prompt)
    }

    /// Narrate an answer grounded in the supplied material
    pub async fn narrate(
        &self,
        query: &Query,
        evidence: &[EvidenceChunk],
        market: &[MarketDatum],
        analysis: &AnalysisResult,
    ) -> Result<Narration> {
        let prompt = self.render_prompt(query, evidence, market, analysis)?;
        debug!(query_id = %query.id, prompt_chars = prompt.len(), "narrating");

        let request = GenerationRequest::new(prompt)
            .with_system(GROUNDING_INSTRUCTION)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        self.provider.generate(request).await
    }

    /// Provider name behind this narrator
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use chrono::Utc;
    use finsight_core::{MarketField, Metric, MetricKind, Modality};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Provider that records the request and returns canned text
    struct RecordingProvider {
        last_request: Mutex<Option<GenerationRequest>>,
        fail: bool,
    }

    impl RecordingProvider {
        fn new(fail: bool) -> Self {
            Self {
                last_request: Mutex::new(None),
                fail,
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for RecordingProvider {
        async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
            *self.last_request.lock().unwrap() = Some(request);
            if self.fail {
                return Err(LlmError::RequestFailed("provider down".to_string()));
            }
            Ok(Generation {
                text: "AAPL closed at 150.00.".to_string(),
                confidence: 0.9,
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn chunk(text: &str) -> EvidenceChunk {
        EvidenceChunk {
            id: Uuid::new_v4(),
            document_id: "doc-abc".to_string(),
            text: text.to_string(),
            embedding: vec![],
            similarity: 0.8,
            retrieved_at: Utc::now(),
        }
    }

    fn datum() -> MarketDatum {
        MarketDatum {
            symbol: "AAPL".to_string(),
            field: MarketField::Price,
            value: 150.0,
            as_of: Utc::now(),
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_prompt_contains_all_inputs() {
        let provider = Arc::new(RecordingProvider::new(false));
        let narrator = Narrator::new(provider.clone(), NarratorConfig::default()).unwrap();

        let query = Query::new("What's AAPL's price?", Modality::Text);
        let evidence = vec![chunk("Apple designs consumer electronics.")];
        let market = vec![datum()];
        let analysis = AnalysisResult {
            metrics: vec![Metric {
                kind: MetricKind::AvgDailyReturnPct,
                symbol: Some("AAPL".to_string()),
                value: 0.42,
            }],
            evidence_ids: vec![],
            symbols: vec!["AAPL".to_string()],
        };

        narrator
            .narrate(&query, &evidence, &market, &analysis)
            .await
            .unwrap();

        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert!(request.prompt.contains("What's AAPL's price?"));
        assert!(request.prompt.contains("Apple designs consumer electronics."));
        assert!(request.prompt.contains("150.00"));
        assert!(request.prompt.contains("average daily return"));
        assert!(request.system.as_deref().unwrap().contains("Do not invent facts"));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(RecordingProvider::new(true));
        let narrator = Narrator::new(provider, NarratorConfig::default()).unwrap();

        let query = Query::new("Summarize risk exposure", Modality::Text);
        let result = narrator
            .narrate(&query, &[], &[], &AnalysisResult::default())
            .await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_narration_carries_confidence() {
        let provider = Arc::new(RecordingProvider::new(false));
        let narrator = Narrator::new(provider, NarratorConfig::default()).unwrap();

        let query = Query::new("anything", Modality::Text);
        let narration = narrator
            .narrate(&query, &[], &[], &AnalysisResult::default())
            .await
            .unwrap();
        assert!((narration.confidence - 0.9).abs() < 1e-6);
    }
}
