//! Document store, embedding, and retrieval for finsight
//!
//! This crate owns the ingestion pipeline (chunking + embedding), the
//! append-only in-memory vector index, and the `Retriever` that applies the
//! similarity threshold and minimum-evidence policy on top of index search.

pub mod chunker;
pub mod embed;
pub mod error;
pub mod retriever;
pub mod seed;
pub mod store;

pub use chunker::Chunker;
pub use embed::{Embedder, HashEmbedder, cosine_similarity};
pub use error::{IndexError, Result};
pub use retriever::{Retriever, RetrieverConfig, mean_similarity};
pub use store::{IngestFailure, IngestReport, VectorIndex};
