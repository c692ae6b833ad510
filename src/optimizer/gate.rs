//! Cheap pre-filter that decides whether a topic looks like an email request.
//!
//! False positives and negatives are expected; the point is to avoid spending
//! a generation call on input like "hi" or "asdfgh".

/// Minimum trimmed length, in characters, of an acceptable topic.
const MIN_TOPIC_CHARS: usize = 10;

/// Substrings that mark a topic as email-related.
const EMAIL_KEYWORDS: &[&str] = &[
    "email", "write", "request", "ask", "inform", "invite", "apply", "resign", "leave", "meeting",
    "reminder", "follow up", "apology", "proposal", "update", "feedback", "manager", "team",
    "client", "customer",
];

/// Shown to the user when the gate rejects a topic.
pub const REJECTION_GUIDANCE: &str = "Please enter a proper question or instruction for the email \
    you want to generate (e.g., 'Write an email to ask my manager for sick leave').";

/// Returns `true` when `text` plausibly describes an email to write.
pub fn is_email_prompt(text: &str) -> bool {
    if text.trim().chars().count() < MIN_TOPIC_CHARS {
        return false;
    }

    let lower = text.to_lowercase();
    if EMAIL_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return true;
    }

    lower.starts_with("how ") || lower.starts_with("please ") || lower.ends_with('?')
}
