//! Structured rubric result produced by the evaluator.

use serde::{Deserialize, Serialize};

use crate::llm::ResponseSchema;

/// Lowest and highest score the rubric allows.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// Rubric result for one email. All ten fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Feedback {
    /// Tone of the email, e.g. formal, friendly, assertive.
    pub tone: String,
    pub clarity_score: f64,
    pub professionalism_score: f64,
    pub call_to_action_present: bool,
    /// Suggestions to improve tone, clarity, or effectiveness.
    pub suggestions: Vec<String>,
    pub grammar_spelling_score: f64,
    /// Whether it is clear what the recipient should do next.
    pub actionability: bool,
    /// Whether the tone and style suit the intended recipient.
    pub audience_appropriateness: bool,
    pub subject_line_suggestion: String,
    pub conciseness_score: f64,
}

impl Feedback {
    /// Check every score lies in 0–10.
    pub fn validate(&self) -> Result<(), String> {
        for (field, score) in self.scores() {
            if !SCORE_RANGE.contains(&score) {
                return Err(format!("{field} must be between 0 and 10, got {score}"));
            }
        }
        Ok(())
    }

    fn scores(&self) -> [(&'static str, f64); 4] {
        [
            ("clarity_score", self.clarity_score),
            ("professionalism_score", self.professionalism_score),
            ("grammar_spelling_score", self.grammar_spelling_score),
            ("conciseness_score", self.conciseness_score),
        ]
    }

    /// Whether this feedback is good enough to stop optimizing.
    pub fn meets(&self, bar: &QualityBar) -> bool {
        self.clarity_score >= bar.min_clarity
            && self.professionalism_score >= bar.min_professionalism
            && self.call_to_action_present
            && self.grammar_spelling_score >= bar.min_grammar_spelling
            && self.actionability
            && self.audience_appropriateness
            && self.conciseness_score >= bar.min_conciseness
            && self.suggestions.len() < bar.max_suggestions
    }

    /// Schema handed to the model for structured output.
    pub fn response_schema() -> ResponseSchema {
        let score = |description: &str| {
            serde_json::json!({
                "type": "number",
                "minimum": 0,
                "maximum": 10,
                "description": description
            })
        };
        let flag = |description: &str| {
            serde_json::json!({"type": "boolean", "description": description})
        };
        let text = |description: &str| {
            serde_json::json!({"type": "string", "description": description})
        };

        ResponseSchema::new(
            "email_feedback",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "tone": text("Tone of the email, e.g., formal, informal, friendly, assertive, etc."),
                    "clarity_score": score("Score (0-10) representing how clear and understandable the email is."),
                    "professionalism_score": score("Score (0-10) representing how professional the email sounds."),
                    "call_to_action_present": flag("Whether a clear call-to-action is present in the email."),
                    "suggestions": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Suggestions to improve tone, clarity, or effectiveness."
                    },
                    "grammar_spelling_score": score("Score (0-10) for grammatical correctness and spelling."),
                    "actionability": flag("Is it clear what the recipient should do next?"),
                    "audience_appropriateness": flag("Is the tone/style suitable for the intended recipient?"),
                    "subject_line_suggestion": text("Suggested subject line for the email."),
                    "conciseness_score": score("Score (0-10) for how concise and to-the-point the email is.")
                },
                "required": [
                    "tone",
                    "clarity_score",
                    "professionalism_score",
                    "call_to_action_present",
                    "suggestions",
                    "grammar_spelling_score",
                    "actionability",
                    "audience_appropriateness",
                    "subject_line_suggestion",
                    "conciseness_score"
                ],
                "additionalProperties": false
            }),
        )
    }
}

/// Thresholds an email must reach for the loop to stop early.
/// Score bounds are inclusive; `max_suggestions` is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityBar {
    pub min_clarity: f64,
    pub min_professionalism: f64,
    pub min_grammar_spelling: f64,
    pub min_conciseness: f64,
    pub max_suggestions: usize,
}

impl Default for QualityBar {
    fn default() -> Self {
        Self {
            min_clarity: 9.0,
            min_professionalism: 9.0,
            min_grammar_spelling: 9.0,
            min_conciseness: 8.5,
            max_suggestions: 2,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Feedback sitting exactly on every threshold.
    pub(crate) fn boundary_feedback() -> Feedback {
        Feedback {
            tone: "formal".into(),
            clarity_score: 9.0,
            professionalism_score: 9.0,
            call_to_action_present: true,
            suggestions: vec![],
            grammar_spelling_score: 9.0,
            actionability: true,
            audience_appropriateness: true,
            subject_line_suggestion: "Sick leave request".into(),
            conciseness_score: 8.5,
        }
    }

    #[test]
    fn boundary_values_pass() {
        assert!(boundary_feedback().meets(&QualityBar::default()));
    }

    #[test]
    fn one_suggestion_still_passes() {
        let feedback = Feedback {
            suggestions: vec!["Mention the dates".into()],
            ..boundary_feedback()
        };
        assert!(feedback.meets(&QualityBar::default()));
    }

    #[test]
    fn any_single_miss_fails() {
        let bar = QualityBar::default();
        let base = boundary_feedback();
        let misses = [
            Feedback { clarity_score: 8.99, ..base.clone() },
            Feedback { professionalism_score: 8.99, ..base.clone() },
            Feedback { grammar_spelling_score: 8.99, ..base.clone() },
            Feedback { conciseness_score: 8.49, ..base.clone() },
            Feedback { call_to_action_present: false, ..base.clone() },
            Feedback { actionability: false, ..base.clone() },
            Feedback { audience_appropriateness: false, ..base.clone() },
            Feedback {
                suggestions: vec!["Shorten".into(), "Add a deadline".into()],
                ..base.clone()
            },
        ];
        for (i, feedback) in misses.iter().enumerate() {
            assert!(!feedback.meets(&bar), "case {i} should fail the bar");
        }
    }

    #[test]
    fn validate_rejects_out_of_range_scores() {
        assert!(boundary_feedback().validate().is_ok());

        let too_high = Feedback { clarity_score: 10.5, ..boundary_feedback() };
        let err = too_high.validate().unwrap_err();
        assert!(err.contains("clarity_score"));

        let negative = Feedback { conciseness_score: -1.0, ..boundary_feedback() };
        assert!(negative.validate().is_err());

        let nan = Feedback { grammar_spelling_score: f64::NAN, ..boundary_feedback() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn deserialize_requires_every_field() {
        let mut json = serde_json::to_value(boundary_feedback()).unwrap();
        json.as_object_mut().unwrap().remove("actionability");
        assert!(serde_json::from_value::<Feedback>(json).is_err());
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let mut json = serde_json::to_value(boundary_feedback()).unwrap();
        json["sentiment"] = serde_json::json!("positive");
        assert!(serde_json::from_value::<Feedback>(json).is_err());
    }

    #[test]
    fn schema_requires_all_ten_fields() {
        let schema = Feedback::response_schema();
        let required = schema.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 10);
        let properties = schema.schema["properties"].as_object().unwrap();
        for field in required {
            assert!(properties.contains_key(field.as_str().unwrap()));
        }
    }
}
