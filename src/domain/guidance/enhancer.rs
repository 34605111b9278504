//! Prompt enhancement contract and rule formatting

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::rule::Rule;
use crate::domain::DomainError;

/// Rewritten prompt and how it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    pub prompt: String,
    /// True when the rules were appended verbatim instead of woven in by a model
    pub fallback_used: bool,
}

/// Rewrites a prompt so it enforces a set of rules
#[async_trait]
pub trait PromptEnhancer: Send + Sync + Debug {
    /// Rewrite `prompt` to enforce `rules`. Implementations degrade to
    /// [`fallback_prompt`] rather than fail.
    async fn enhance(&self, prompt: &str, rules: &[Rule]) -> Result<Enhancement, DomainError>;
}

/// Numbered rule list for the rewriting model
pub fn rules_block(rules: &[Rule]) -> String {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. [MANDATORY] {}", i + 1, rule.rule_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt with the rules appended as plain requirements
pub fn fallback_prompt(prompt: &str, rules: &[Rule]) -> String {
    let requirements = rules
        .iter()
        .map(|rule| format!("- [MANDATORY] {}", rule.rule_text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\nMANDATORY ORGANIZATIONAL REQUIREMENTS (enforce all of these):\n{}",
        prompt, requirements
    )
}
