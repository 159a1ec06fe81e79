//! Query-time retrieval with relevance gating
//!
//! The retriever embeds the query, searches the index, and refuses to return
//! low-quality evidence: chunks below the similarity threshold are dropped,
//! and if too few survive the caller gets `NoRelevantEvidence` instead of
//! noise. That signal is what drives orchestrator fallback.

use std::sync::Arc;

use tracing::debug;

use finsight_core::{EvidenceChunk, Query};

use crate::embed::Embedder;
use crate::error::{IndexError, Result};
use crate::store::VectorIndex;

/// Tunables for retrieval
///
/// The threshold and minimum count materially change how often the
/// orchestrator falls back, so they are configuration rather than constants.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Default number of chunks to request from the index
    pub top_k: usize,
    /// Chunks scoring below this are discarded
    pub min_similarity: f32,
    /// Minimum surviving chunks required to report evidence at all
    pub min_results: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_similarity: 0.3,
            min_results: 1,
        }
    }
}

/// Retrieves ranked evidence for a query
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    config: RetrieverConfig,
}

impl Retriever {
    /// Create a retriever over the given index
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>, config: RetrieverConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Retrieve up to `k` relevant chunks for the query
    ///
    /// Returns `NoRelevantEvidence` when fewer than the configured minimum
    /// clear the similarity threshold.
    pub async fn retrieve(&self, query: &Query, k: usize) -> Result<Vec<EvidenceChunk>> {
        let embedding = self
            .embedder
            .embed(&query.text)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        let candidates = self.index.search(&embedding, k)?;
        let total = candidates.len();

        let survivors: Vec<EvidenceChunk> = candidates
            .into_iter()
            .filter(|c| c.similarity >= self.config.min_similarity)
            .collect();

        debug!(
            query_id = %query.id,
            candidates = total,
            survivors = survivors.len(),
            threshold = self.config.min_similarity,
            "retrieval complete"
        );

        if survivors.len() < self.config.min_results {
            return Err(IndexError::NoRelevantEvidence);
        }
        Ok(survivors)
    }

    /// Retrieve using the configured default `top_k`
    pub async fn retrieve_default(&self, query: &Query) -> Result<Vec<EvidenceChunk>> {
        self.retrieve(query, self.config.top_k).await
    }

    /// The active configuration
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }
}

/// Mean similarity across a set of retrieved chunks
///
/// Used as the retrieval confidence signal when deciding whether retrieved
/// context is trustworthy enough to ground generation on.
pub fn mean_similarity(chunks: &[EvidenceChunk]) -> f32 {
    if chunks.is_empty() {
        return 0.0;
    }
    chunks.iter().map(|c| c.similarity).sum::<f32>() / chunks.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::embed::HashEmbedder;
    use finsight_core::Modality;

    async fn seeded_retriever(min_similarity: f32) -> Retriever {
        let embedder = Arc::new(HashEmbedder::new(128));
        let index = Arc::new(VectorIndex::new(embedder.clone(), Chunker::new(200, 40)));
        index
            .ingest(&[
                "Risk management identifies, analyzes, and mitigates financial risks.".to_string(),
                "Blockchain is a decentralized distributed ledger.".to_string(),
            ])
            .await
            .unwrap();

        Retriever::new(
            embedder,
            index,
            RetrieverConfig {
                top_k: 4,
                min_similarity,
                min_results: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_relevant_query_returns_evidence() {
        let retriever = seeded_retriever(0.1).await;
        let query = Query::new("how is financial risk managed", Modality::Text);

        let chunks = retriever.retrieve_default(&query).await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks[0].text.contains("Risk management"));
    }

    #[tokio::test]
    async fn test_irrelevant_query_yields_no_relevant_evidence() {
        // Threshold high enough that unrelated text cannot clear it
        let retriever = seeded_retriever(0.95).await;
        let query = Query::new("zyx qwv unrelated gibberish", Modality::Text);

        let err = retriever.retrieve_default(&query).await.unwrap_err();
        assert!(matches!(err, IndexError::NoRelevantEvidence));
    }

    #[tokio::test]
    async fn test_threshold_filters_low_scores() {
        let lenient = seeded_retriever(0.0).await;
        let strict = seeded_retriever(0.5).await;
        let query = Query::new("financial risk", Modality::Text);

        let all = lenient.retrieve_default(&query).await.unwrap();
        let filtered = strict.retrieve_default(&query).await;

        match filtered {
            Ok(chunks) => assert!(chunks.len() <= all.len()),
            Err(IndexError::NoRelevantEvidence) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_mean_similarity_of_empty_set() {
        assert_eq!(mean_similarity(&[]), 0.0);
    }
}
