//! Draft evaluator: scores an email against the fixed ten-point rubric.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use crate::error::OptimizeError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, ResponseSchema};

use super::feedback::Feedback;

/// Scores emails through the LLM provider's structured-output mode.
pub struct DraftEvaluator {
    llm: Arc<dyn LlmProvider>,
    schema: ResponseSchema,
}

impl DraftEvaluator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            schema: Feedback::response_schema(),
        }
    }

    /// Evaluate one email. Anything that does not parse into a complete,
    /// in-range `Feedback` is an evaluation error.
    pub async fn evaluate(
        &self,
        email: &str,
        api_key: &SecretString,
    ) -> Result<Feedback, OptimizeError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(build_rubric_prompt(email))]);

        let value = self
            .llm
            .complete_structured(request, &self.schema, api_key)
            .await
            .map_err(|e| OptimizeError::Evaluation(e.to_string()))?;

        let feedback = parse_feedback(value)?;
        info!(
            tone = %feedback.tone,
            clarity = feedback.clarity_score,
            professionalism = feedback.professionalism_score,
            grammar = feedback.grammar_spelling_score,
            conciseness = feedback.conciseness_score,
            suggestions = feedback.suggestions.len(),
            "Evaluated email draft"
        );
        Ok(feedback)
    }
}

/// Deserialize and range-check a structured evaluation.
fn parse_feedback(value: serde_json::Value) -> Result<Feedback, OptimizeError> {
    let feedback: Feedback = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Evaluation did not match the feedback schema");
        OptimizeError::Evaluation(format!("response did not match the feedback schema: {e}"))
    })?;

    feedback.validate().map_err(|reason| {
        warn!(reason = %reason, "Evaluation scores out of range");
        OptimizeError::Evaluation(reason)
    })?;

    Ok(feedback)
}

/// Build the rubric prompt for one email.
fn build_rubric_prompt(email: &str) -> String {
    format!(
        "Please analyze the following email and provide structured feedback for each of the following aspects:\n\n\
         - Tone\n\
         - Clarity (0-10)\n\
         - Professionalism (0-10)\n\
         - Call-to-action presence\n\
         - Suggestions for improvement\n\
         - Grammar and spelling (0-10)\n\
         - Actionability (is the next step clear?)\n\
         - Audience appropriateness\n\
         - Subject line suggestion\n\
         - Conciseness (0-10)\n\n\
         Email:\n{email}"
    )
}
