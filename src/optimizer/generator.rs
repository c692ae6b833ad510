//! Draft generator: turns a topic (and optionally prior feedback) into an email.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::error::OptimizeError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::feedback::Feedback;

/// Writes email drafts through the LLM provider.
pub struct DraftGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl DraftGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate one draft. With `feedback`, the prompt asks for a revision
    /// that addresses it.
    pub async fn generate(
        &self,
        topic: &str,
        feedback: Option<&Feedback>,
        api_key: &SecretString,
    ) -> Result<String, OptimizeError> {
        let prompt = build_generation_prompt(topic, feedback)?;
        debug!(revision = feedback.is_some(), "Requesting email draft");

        let response = self
            .llm
            .complete(CompletionRequest::new(vec![ChatMessage::user(prompt)]), api_key)
            .await
            .map_err(|e| OptimizeError::Generation(e.to_string()))?;

        let draft = response.content.trim();
        if draft.is_empty() {
            return Err(OptimizeError::Generation(
                "model returned an empty email".to_string(),
            ));
        }

        info!(
            chars = draft.chars().count(),
            output_tokens = response.output_tokens,
            "Generated email draft"
        );
        Ok(draft.to_string())
    }
}

// ── Prompt construction ─────────────────────────────────────────────

const STRUCTURE: &str = "Structure:\n\
    1. Introduction: Begin with a polite opener and briefly state the purpose.\n\
    2. Main Content: Provide details clearly and concisely.\n\
    3. Conclusion: Summarize and close politely.\n";

/// Build the generation prompt for a first draft or a revision.
fn build_generation_prompt(
    topic: &str,
    feedback: Option<&Feedback>,
) -> Result<String, OptimizeError> {
    let prompt = match feedback {
        None => format!(
            "Write a professional email about the topic: '{topic}'.\n\n\
             {STRUCTURE}\n\
             IMPORTANT:\n\
             - Only return the email content itself (no analysis, no extra commentary).\n\
             - Suggest a subject line at the top.\n\
             - Ensure the email is clear, professional, actionable, and appropriate for the recipient."
        ),
        Some(feedback) => format!(
            "Write a professional email on the topic '{topic}'.\n\n\
             {STRUCTURE}\n\
             IMPORTANT:\n\
             - Only return the email content itself (no analysis, no extra commentary).\n\
             - Incorporate improvements based on this feedback: {feedback}\n\
             - Pay special attention to grammar, spelling, conciseness, actionability, and audience appropriateness.\n\
             - Suggest a subject line at the top.",
            feedback = render_feedback(feedback)?,
        ),
    };
    Ok(prompt)
}

fn render_feedback(feedback: &Feedback) -> Result<String, OptimizeError> {
    serde_json::to_string(feedback)
        .map_err(|e| OptimizeError::Generation(format!("failed to render feedback: {e}")))
}
