//! Generation and embedding providers for finsight
//!
//! Defines the `GenerationProvider` trait, the Gemini implementation of both
//! generation and embedding, and the `Narrator` that turns structured
//! evidence and metrics into grounded natural-language answers.

pub mod error;
pub mod gemini;
pub mod narrator;
pub mod provider;

pub use error::{LlmError, Result};
pub use gemini::{GeminiConfig, GeminiEmbedder, GeminiProvider};
pub use narrator::{Narration, Narrator, NarratorConfig};
pub use provider::{Generation, GenerationProvider, GenerationRequest};
