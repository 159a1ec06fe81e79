//! Query orchestration for the finsight assistant
//!
//! Ties the index, market gateway, analyzer, and narrator together behind a
//! single `Assistant` facade. The orchestrator routes each query by intent,
//! gathers evidence and market data concurrently, and always produces an
//! answer: sub-call failures degrade the response instead of failing it.

pub mod intent;
pub mod orchestrator;
pub mod registry;
pub mod service;

pub use intent::{IntentRouter, QueryIntent, RoutingDecision};
pub use orchestrator::{Orchestrator, OrchestratorConfig, Stage};
pub use registry::{Capability, CapabilityRegistry};
pub use service::{Assistant, IngestRequest, IngestResponse, QueryRequest, QueryResponse};
