//! Configuration types.
//!
//! Everything is read from the environment with defaults. The API key is
//! deliberately absent: every request carries its own credential.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default Groq model used for both generation and evaluation.
pub const DEFAULT_MODEL: &str = "moonshotai/kimi-k2-instruct-0905";

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8501,
        }
    }
}

impl ServerConfig {
    /// Build config from `EMAIL_OPTIMIZER_BIND` and `EMAIL_OPTIMIZER_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bind: env_or("EMAIL_OPTIMIZER_BIND", defaults.bind)?,
            port: env_or("EMAIL_OPTIMIZER_PORT", defaults.port)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Settings for the model endpoint. Shared by every request.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-call network timeout, enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ModelConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let temperature: f32 = env_or("EMAIL_OPTIMIZER_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "EMAIL_OPTIMIZER_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let timeout_secs: u64 =
            env_or("EMAIL_OPTIMIZER_TIMEOUT_SECS", defaults.timeout.as_secs())?;

        Ok(Self {
            base_url: std::env::var("GROQ_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: std::env::var("EMAIL_OPTIMIZER_MODEL").unwrap_or(defaults.model),
            temperature,
            max_tokens: env_or("EMAIL_OPTIMIZER_MAX_TOKENS", defaults.max_tokens)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Read and parse an env var, using `default` when it is unset.
fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_setup() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "moonshotai/kimi-k2-instruct-0905");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(ServerConfig::default().port, 8501);
    }

    #[test]
    fn parse_value_accepts_padded_numbers() {
        let port: u16 = parse_value("PORT", " 9000 ").unwrap();
        assert_eq!(port, 9000);
    }

    #[test]
    fn parse_value_reports_key_on_failure() {
        let err = parse_value::<u16>("EMAIL_OPTIMIZER_PORT", "eighty").unwrap_err();
        match err {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "EMAIL_OPTIMIZER_PORT");
                assert!(message.contains("eighty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn socket_addr_combines_bind_and_port() {
        let config = ServerConfig {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }
}
