//! Prompt injection screening

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Replacement for detected injection attempts
pub const REDACTED: &str = "[REDACTED]";

/// Phrases that try to override system instructions
static INJECTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let patterns = [
        r"ignore\s+(all\s+)?(previous|prior|system|above)\s*(prompt|instruction|rule|guideline)?s?",
        r"disregard\s+(the\s+)?(above|previous|system|all)",
        r"forget\s+(all\s+)?(previous|prior|above|your)",
        r"override\s+(all\s+)?(rule|instruction|guideline|system)",
        r"bypass\s+(the\s+)?(rule|guideline|standard|policy|system)",
        r"do\s+not\s+follow\s+(the\s+)?(rule|instruction|guideline)",
        r"you\s+are\s+now\s+a",
        r"new\s+(system\s+)?instruction",
        r"act\s+as\s+if\s+(you\s+have\s+no|there\s+are\s+no)\s+rule",
    ];
    Regex::new(&format!("(?i){}", patterns.join("|"))).expect("injection patterns are valid")
});

/// A prompt after screening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedPrompt {
    pub text: String,
    /// Whether anything was redacted
    pub flagged: bool,
}

/// Redact injection attempts, keeping the rest of the prompt usable
pub fn sanitize_prompt(prompt: &str) -> SanitizedPrompt {
    if !INJECTION_PATTERN.is_match(prompt) {
        return SanitizedPrompt {
            text: prompt.to_string(),
            flagged: false,
        };
    }

    let text = INJECTION_PATTERN.replace_all(prompt, REDACTED).into_owned();
    warn!(
        original = %preview(prompt),
        sanitized = %preview(&text),
        "Prompt injection pattern detected and redacted"
    );

    SanitizedPrompt {
        text,
        flagged: true,
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
