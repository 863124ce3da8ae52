//! Core types for the bridge.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (InvocationId, SessionId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the engine, LLM and policy

mod config;
mod errors;
mod ids;

pub use config::{Config, EngineConfig, LlmConfig, ObservabilityConfig, PolicyConfig};
pub use errors::{Error, Result};
pub use ids::{InvocationId, SessionId};
