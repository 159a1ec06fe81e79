//! Append-only in-memory vector index
//!
//! Ingestion embeds every chunk of a document batch before taking the write
//! lock, so concurrent searches never observe a partially written document.
//! Entries are immutable once inserted; only `rebuild` evicts them.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use finsight_core::{ChunkId, EvidenceChunk};

use crate::chunker::Chunker;
use crate::embed::{Embedder, cosine_similarity};
use crate::error::{IndexError, Result};

/// One embedded chunk as stored in the index
#[derive(Debug, Clone)]
struct StoredChunk {
    id: ChunkId,
    document_id: String,
    text: String,
    embedding: Vec<f32>,
    inserted_at: DateTime<Utc>,
}

/// A document that failed to ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Derived id of the failing document
    pub document_id: String,
    /// Why ingestion failed
    pub reason: String,
}

/// Outcome of a bulk ingestion call
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestReport {
    /// Number of documents fully ingested
    pub ingested: usize,
    /// Per-document failures; these never abort the batch
    pub errors: Vec<IngestFailure>,
}

/// In-memory nearest-neighbor index over embedded document chunks
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    chunks: RwLock<Vec<StoredChunk>>,
    closed: AtomicBool,
}

impl VectorIndex {
    /// Create an empty index backed by the given embedder
    pub fn new(embedder: Arc<dyn Embedder>, chunker: Chunker) -> Self {
        Self {
            embedder,
            chunker,
            chunks: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Derive a stable document id from content
    ///
    /// Content-addressed so re-ingesting the identical document set yields
    /// the same ids.
    fn document_id(text: &str) -> String {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("doc-{:016x}", hasher.finish())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Unavailable("index is closed".to_string()));
        }
        Ok(())
    }

    /// Ingest a batch of raw documents
    ///
    /// Each document is chunked and embedded up front; the write lock is only
    /// taken for the final append, and never across an await point. A
    /// document whose embedding fails is reported in the returned
    /// `IngestReport` without aborting the rest of the batch.
    pub async fn ingest(&self, documents: &[String]) -> Result<IngestReport> {
        self.ensure_open()?;

        let mut report = IngestReport::default();
        let mut prepared: Vec<StoredChunk> = Vec::new();

        for document in documents {
            let document_id = Self::document_id(document);
            let mut document_chunks = Vec::new();
            let mut failed = None;

            for text in self.chunker.split(document) {
                match self.embedder.embed(&text).await {
                    Ok(embedding) => document_chunks.push(StoredChunk {
                        id: Uuid::new_v4(),
                        document_id: document_id.clone(),
                        text,
                        embedding,
                        inserted_at: Utc::now(),
                    }),
                    Err(e) => {
                        failed = Some(e.to_string());
                        break;
                    }
                }
            }

            match failed {
                Some(reason) => {
                    warn!(document_id = %document_id, %reason, "document failed to ingest");
                    report.errors.push(IngestFailure {
                        document_id,
                        reason,
                    });
                }
                None => {
                    // A document is ingested whole or not at all
                    prepared.extend(document_chunks);
                    report.ingested += 1;
                }
            }
        }

        let mut chunks = self
            .chunks
            .write()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;
        chunks.extend(prepared);

        info!(
            ingested = report.ingested,
            failed = report.errors.len(),
            total_chunks = chunks.len(),
            "ingestion batch complete"
        );
        Ok(report)
    }

    /// Nearest-neighbor search over all stored chunks
    ///
    /// Returns up to `k` chunks ordered by descending similarity; equal
    /// scores are broken by most-recent insertion timestamp.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<EvidenceChunk>> {
        self.ensure_open()?;

        let chunks = self
            .chunks
            .read()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;

        let mut scored: Vec<(f32, &StoredChunk)> = chunks
            .iter()
            .map(|chunk| (cosine_similarity(query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|(sim_a, a), (sim_b, b)| {
            sim_b
                .total_cmp(sim_a)
                .then_with(|| b.inserted_at.cmp(&a.inserted_at))
        });

        let results: Vec<EvidenceChunk> = scored
            .into_iter()
            .take(k)
            .map(|(similarity, chunk)| EvidenceChunk {
                id: chunk.id,
                document_id: chunk.document_id.clone(),
                text: chunk.text.clone(),
                embedding: chunk.embedding.clone(),
                similarity,
                retrieved_at: chunk.inserted_at,
            })
            .collect();

        debug!(k, returned = results.len(), "index search complete");
        Ok(results)
    }

    /// Drop every stored chunk
    ///
    /// This is the only eviction path; incremental ingestion never removes
    /// entries.
    pub fn rebuild(&self) -> Result<()> {
        self.ensure_open()?;
        let mut chunks = self
            .chunks
            .write()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;
        chunks.clear();
        info!("index rebuilt (all chunks evicted)");
        Ok(())
    }

    /// Close the index; subsequent calls fail with `Unavailable`
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
