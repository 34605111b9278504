//! Guidance: organizational rules retrieved by relevance and enforced on prompts

mod enhancer;
mod retriever;
mod rule;
mod sanitizer;

pub use enhancer::{fallback_prompt, rules_block, Enhancement, PromptEnhancer};
pub use retriever::{RuleRetriever, DEFAULT_GLOBAL_DOMAIN};
pub use rule::{
    namespace_domain, project_matches, rule_namespace, IngestOutcome, IngestRuleRequest, RetrievedRule, Rule,
    ALL_PROJECTS, RULE_NAMESPACE_PREFIX,
};
pub use sanitizer::{sanitize_prompt, SanitizedPrompt, REDACTED};

#[cfg(test)]
pub use enhancer::mock::MockPromptEnhancer;
