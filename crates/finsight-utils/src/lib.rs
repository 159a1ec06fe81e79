//! Shared utilities for finsight
//!
//! Logging setup and process-level configuration used across the finsight
//! workspace.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{init_tracing, init_tracing_json};
