//! Core data model and error taxonomy for the finsight assistant
//!
//! This crate defines the request/response types shared by every component:
//! queries, evidence chunks, market data, analysis results, and the final
//! `Answer`, plus the per-request context that enforces citation provenance.

pub mod context;
pub mod error;
pub mod model;

pub use context::RequestContext;
pub use error::{Error, Result};
pub use model::{
    Answer, AnalysisResult, ChunkId, EvidenceChunk, MarketDatum, MarketField, Metric, MetricKind,
    Modality, Query,
};
