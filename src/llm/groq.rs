//! Groq backend over its OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ResponseSchema,
};

const PROVIDER: &str = "groq";

/// Groq chat-completions client.
///
/// Holds a pooled HTTP client and model settings; no credential.
pub struct GroqProvider {
    http: reqwest::Client,
    config: ModelConfig,
}

impl GroqProvider {
    pub fn new(config: ModelConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn send(
        &self,
        body: &ChatCompletionBody<'_>,
        api_key: &SecretString,
    ) -> Result<ChatCompletion, LlmError> {
        debug!(
            model = %self.config.model,
            messages = body.messages.len(),
            structured = body.response_format.is_some(),
            "Sending chat completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: if e.is_timeout() {
                    format!("timed out after {:?}", self.config.timeout)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, retry_after));
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to parse response body: {e}"),
            })
    }

    fn body<'a>(
        &'a self,
        request: &'a CompletionRequest,
        response_format: Option<ResponseFormat<'a>>,
    ) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format,
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: &SecretString,
    ) -> Result<CompletionResponse, LlmError> {
        let completion = self.send(&self.body(&request, None), api_key).await?;
        into_response(completion)
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: &ResponseSchema,
        api_key: &SecretString,
    ) -> Result<serde_json::Value, LlmError> {
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: &schema.name,
                schema: &schema.schema,
            },
        };
        let completion = self.send(&self.body(&request, Some(format)), api_key).await?;
        let response = into_response(completion)?;
        if response.finish_reason == FinishReason::Length {
            warn!(
                output_tokens = response.output_tokens,
                "Structured completion hit the token limit"
            );
        }
        parse_json_content(&response.content)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat<'a> {
    JsonSchema { json_schema: JsonSchemaFormat<'a> },
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Response handling ───────────────────────────────────────────────

fn into_response(completion: ChatCompletion) -> Result<CompletionResponse, LlmError> {
    let usage = completion.usage.unwrap_or_default();
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "response contained no choices".to_string(),
        })?;

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
    })
}

fn status_error(status: StatusCode, body: &str, retry_after: Option<Duration>) -> LlmError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after,
        };
    }

    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason: format!("HTTP {status}: {detail}"),
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Parse the JSON document out of a structured completion.
fn parse_json_content(content: &str) -> Result<serde_json::Value, LlmError> {
    let json_str = extract_json_object(content);
    serde_json::from_str(json_str).map_err(|e| LlmError::InvalidResponse {
        provider: PROVIDER.to_string(),
        reason: format!("model output is not valid JSON: {e}"),
    })
}

/// Extract a JSON object from model output (handles markdown wrapping).
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GroqProvider {
        GroqProvider::new(ModelConfig::default()).unwrap()
    }

    #[test]
    fn endpoint_appends_chat_completions() {
        assert_eq!(
            provider().endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn body_uses_configured_sampling() {
        let groq = provider();
        let request = CompletionRequest::new(vec![ChatMessage::user("hello")]);
        let json = serde_json::to_value(groq.body(&request, None)).unwrap();

        assert_eq!(json["model"], "moonshotai/kimi-k2-instruct-0905");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn body_serializes_json_schema_format() {
        let groq = provider();
        let request = CompletionRequest::new(vec![ChatMessage::user("rate this")]);
        let schema = serde_json::json!({"type": "object"});
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: "feedback",
                schema: &schema,
            },
        };
        let json = serde_json::to_value(groq.body(&request, Some(format))).unwrap();

        assert_eq!(json["response_format"]["type"], "json_schema");
        assert_eq!(json["response_format"]["json_schema"]["name"], "feedback");
        assert_eq!(json["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn into_response_reads_first_choice() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "Subject: Hi"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            }"#,
        )
        .unwrap();

        let response = into_response(completion).unwrap();
        assert_eq!(response.content, "Subject: Hi");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 3);
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn into_response_without_choices_is_invalid() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            into_response(completion),
            Err(LlmError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn status_error_maps_auth_and_rate_limits() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "", None),
            LlmError::AuthFailed { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", Some(Duration::from_secs(2))),
            LlmError::RateLimited {
                retry_after: Some(d),
                ..
            } if d == Duration::from_secs(2)
        ));
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "2".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));

        headers.insert(reqwest::header::RETRY_AFTER, "0.5".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_millis(500)));
    }

    #[test]
    fn retry_after_ignores_unrepresentable_values() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        for value in ["1e30", "-1", "NaN", "inf", "Wed, 21 Oct 2026 07:28:00 GMT"] {
            headers.insert(reqwest::header::RETRY_AFTER, value.parse().unwrap());
            assert_eq!(retry_after(&headers), None, "value {value:?}");
        }
    }

    #[test]
    fn status_error_surfaces_provider_message() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        let err = status_error(StatusCode::NOT_FOUND, body, None);
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("model not found"));
    }

    #[test]
    fn extract_json_direct_object() {
        let input = r#"{"tone": "formal"}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extract_json_from_markdown_block() {
        let input = "```json\n{\"tone\": \"formal\"}\n```";
        assert_eq!(extract_json_object(input), "{\"tone\": \"formal\"}");
    }

    #[test]
    fn extract_json_embedded_in_text() {
        let input = "Here is the review: {\"tone\": \"warm\"} Thanks.";
        assert_eq!(extract_json_object(input), "{\"tone\": \"warm\"}");
    }

    #[test]
    fn parse_json_content_rejects_prose() {
        assert!(matches!(
            parse_json_content("I cannot rate this email."),
            Err(LlmError::InvalidResponse { .. })
        ));
    }
}
