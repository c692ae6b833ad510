//! Email optimization.
//!
//! A request flows through:
//! 1. `gate::is_email_prompt()` — keyword heuristic, no LLM
//! 2. `DraftGenerator::generate()` — first draft, or a revision of the last one
//! 3. `DraftEvaluator::evaluate()` — structured rubric scoring
//! 4. `Feedback::meets()` — stop, or go back to 2 (at most 3 drafts)

pub mod evaluator;
pub mod feedback;
pub mod gate;
pub mod generator;
pub mod workflow;

pub use evaluator::DraftEvaluator;
pub use feedback::{Feedback, QualityBar};
pub use gate::is_email_prompt;
pub use generator::DraftGenerator;
pub use workflow::{MAX_ITERATIONS, OptimizationResult, Optimizer};
