//! Per-request processing context
//!
//! The `RequestContext` is owned by a single request and dropped with it. It
//! records every evidence chunk and market datum consulted while the request
//! was processed, so the final `Answer` can only cite sources that were
//! actually used.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Answer, ChunkId, EvidenceChunk, MarketDatum, Query};

/// Tracks which sources were consulted while answering one query
#[derive(Debug, Default)]
pub struct RequestContext {
    query_id: Uuid,
    consulted_chunks: HashSet<ChunkId>,
    market_data: Vec<MarketDatum>,
    degraded: bool,
}

impl RequestContext {
    /// Create a context for the given query
    pub fn new(query: &Query) -> Self {
        Self {
            query_id: query.id,
            ..Self::default()
        }
    }

    /// The id of the query this context belongs to
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Record evidence chunks returned by the retriever
    pub fn record_evidence(&mut self, chunks: &[EvidenceChunk]) {
        self.consulted_chunks.extend(chunks.iter().map(|c| c.id));
    }

    /// Record market data returned by the gateway
    pub fn record_market(&mut self, data: &[MarketDatum]) {
        self.market_data.extend_from_slice(data);
    }

    /// Market data consulted so far
    pub fn market_data(&self) -> &[MarketDatum] {
        &self.market_data
    }

    /// Whether the given chunk was consulted for this request
    pub fn was_consulted(&self, id: ChunkId) -> bool {
        self.consulted_chunks.contains(&id)
    }

    /// Mark the request as degraded (some fallback branch was taken)
    pub fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    /// Whether any fallback branch was taken
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Assemble the final answer, validating citation provenance
    ///
    /// Rejects any citation that was not recorded as consulted during this
    /// request. This keeps the no-orphan-citations invariant enforceable in
    /// one place instead of at every call site.
    pub fn build_answer(
        &self,
        text: impl Into<String>,
        citations: Vec<ChunkId>,
        confidence: f32,
    ) -> Result<Answer> {
        for id in &citations {
            if !self.was_consulted(*id) {
                return Err(Error::Internal(format!(
                    "answer for query {} cites chunk {id} that was never consulted",
                    self.query_id
                )));
            }
        }

        Ok(Answer {
            text: text.into(),
            audio_ref: None,
            citations,
            confidence: confidence.clamp(0.0, 1.0),
            degraded: self.degraded,
        })
    }
}
