//! LLM integration.
//!
//! `LlmProvider` is the seam the optimizer talks to. The only backend is
//! Groq, reached over its OpenAI-compatible HTTP API with `reqwest`.

pub mod groq;
pub mod provider;

pub use groq::GroqProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::LlmError;

/// Create the LLM provider from configuration.
pub fn create_provider(config: &ModelConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = GroqProvider::new(config.clone())?;
    tracing::info!("Using Groq (model: {})", config.model);
    Ok(Arc::new(provider))
}
