//! The generate → evaluate → retry loop.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::OptimizeError;
use crate::llm::LlmProvider;

use super::evaluator::DraftEvaluator;
use super::feedback::{Feedback, QualityBar};
use super::gate::{REJECTION_GUIDANCE, is_email_prompt};
use super::generator::DraftGenerator;

/// Upper bound on generate/evaluate cycles per request.
pub const MAX_ITERATIONS: usize = 3;

/// First and last draft/feedback pairs of one optimization run.
///
/// When the first draft already meets the bar, both pairs are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub initial_email: String,
    pub initial_feedback: Feedback,
    pub final_email: String,
    pub final_feedback: Feedback,
}

/// Runs the optimization loop. Holds no per-request state.
pub struct Optimizer {
    generator: DraftGenerator,
    evaluator: DraftEvaluator,
    bar: QualityBar,
}

impl Optimizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            generator: DraftGenerator::new(Arc::clone(&llm)),
            evaluator: DraftEvaluator::new(llm),
            bar: QualityBar::default(),
        }
    }

    /// Gate the topic, then iterate until the feedback meets the quality bar
    /// or `MAX_ITERATIONS` drafts have been produced.
    ///
    /// Any generation or evaluation failure aborts the whole run; drafts from
    /// earlier iterations are discarded.
    pub async fn optimize(
        &self,
        topic: &str,
        api_key: &SecretString,
    ) -> Result<OptimizationResult, OptimizeError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(OptimizeError::MissingCredential);
        }
        if !is_email_prompt(topic) {
            info!(topic_chars = topic.chars().count(), "Topic rejected by input gate");
            return Err(OptimizeError::InputRejected {
                guidance: REJECTION_GUIDANCE.to_string(),
            });
        }

        let span = info_span!("optimize", request_id = %Uuid::new_v4());
        self.run(topic, api_key).instrument(span).await
    }

    async fn run(
        &self,
        topic: &str,
        api_key: &SecretString,
    ) -> Result<OptimizationResult, OptimizeError> {
        let mut email = self.generator.generate(topic, None, api_key).await?;
        let mut feedback = self.evaluator.evaluate(&email, api_key).await?;
        let initial_email = email.clone();
        let initial_feedback = feedback.clone();

        let mut iteration = 0;
        loop {
            if feedback.meets(&self.bar) {
                info!(iteration, "Email met the quality bar");
                break;
            }
            debug!(iteration, "Email below the quality bar");

            iteration += 1;
            if iteration == MAX_ITERATIONS {
                // Exhaustion is not reported to the caller.
                warn!(
                    iterations = MAX_ITERATIONS,
                    "Returning last email although it never met the quality bar"
                );
                break;
            }

            email = self.generator.generate(topic, Some(&feedback), api_key).await?;
            feedback = self.evaluator.evaluate(&email, api_key).await?;
        }

        Ok(OptimizationResult {
            initial_email,
            initial_feedback,
            final_email: email,
            final_feedback: feedback,
        })
    }
}
