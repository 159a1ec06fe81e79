//! Inbound service facade
//!
//! The `Assistant` is the single entry point front-ends talk to: it accepts
//! query and ingestion requests in wire-friendly shapes, delegates to the
//! orchestrator or index, and maps the internal `Answer` into a response.
//! Speech capture and synthesis live outside this boundary; a voice
//! front-end sends transcribed text and renders the answer text itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use finsight_core::{Answer, ChunkId, Modality, Query};
use finsight_index::VectorIndex;

use crate::orchestrator::Orchestrator;

/// An inbound query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text, already transcribed or extracted if non-textual
    pub text: String,
    /// How the text reached the system
    #[serde(default)]
    pub modality: Modality,
}

/// The response to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Identifier of the query this answers
    pub query_id: uuid::Uuid,
    /// Answer text
    pub answer_text: String,
    /// Opaque handle to rendered speech, when available
    pub audio_ref: Option<String>,
    /// Evidence chunks the answer is grounded in
    pub citations: Vec<ChunkId>,
    /// Confidence in the answer (0.0-1.0)
    pub confidence: f32,
    /// True when any fallback was taken while answering
    pub degraded: bool,
}

impl QueryResponse {
    fn from_answer(query_id: uuid::Uuid, answer: Answer) -> Self {
        Self {
            query_id,
            answer_text: answer.text,
            audio_ref: answer.audio_ref,
            citations: answer.citations,
            confidence: answer.confidence,
            degraded: answer.degraded,
        }
    }
}

/// A bulk document ingestion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Raw document texts
    pub documents: Vec<String>,
}

/// The outcome of a bulk ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Documents fully ingested
    pub ingested: usize,
    /// Per-document failures, keyed by document id
    pub errors: Vec<IngestError>,
}

/// One failed document in a bulk ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    pub document_id: String,
    pub reason: String,
}

/// The assistant service: queries in, answers out
pub struct Assistant {
    orchestrator: Orchestrator,
    index: Arc<VectorIndex>,
}

impl Assistant {
    /// Create the service over a wired orchestrator and its index
    pub fn new(orchestrator: Orchestrator, index: Arc<VectorIndex>) -> Self {
        Self {
            orchestrator,
            index,
        }
    }

    /// Answer one query
    ///
    /// Never fails: degraded answers carry the flag instead.
    pub async fn query(&self, request: QueryRequest) -> QueryResponse {
        let query = Query::new(request.text, request.modality);
        info!(query_id = %query.id, modality = ?query.modality, "query accepted");

        let answer = self.orchestrator.handle(&query).await;
        QueryResponse::from_answer(query.id, answer)
    }

    /// Ingest documents into the index
    ///
    /// Partial failures are reported per document; an unavailable index
    /// fails the whole request.
    pub async fn ingest(&self, request: IngestRequest) -> finsight_core::Result<IngestResponse> {
        let report = self
            .index
            .ingest(&request.documents)
            .await
            .map_err(finsight_core::Error::from)?;

        info!(
            ingested = report.ingested,
            failed = report.errors.len(),
            "ingestion complete"
        );

        Ok(IngestResponse {
            ingested: report.ingested,
            errors: report
                .errors
                .into_iter()
                .map(|f| IngestError {
                    document_id: f.document_id,
                    reason: f.reason,
                })
                .collect(),
        })
    }

    /// Produce the scheduled market brief
    pub async fn market_brief(&self) -> QueryResponse {
        let answer = self.orchestrator.market_brief().await;
        QueryResponse::from_answer(uuid::Uuid::new_v4(), answer)
    }
}
