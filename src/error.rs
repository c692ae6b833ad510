//! Error types for the email optimizer.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Failures of a single optimization request.
///
/// The `Display` text of each variant is what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("{guidance}")]
    InputRejected { guidance: String },

    #[error("An API key is required before an email can be optimized")]
    MissingCredential,

    #[error("Email generation failed: {0}")]
    Generation(String),

    #[error("Email evaluation failed: {0}")]
    Evaluation(String),
}

impl OptimizeError {
    /// Whether the request failed inside the external model call.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Evaluation(_))
    }
}
