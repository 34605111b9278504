//! Guidance API types

use serde::{Deserialize, Serialize};

use crate::domain::guidance::{IngestOutcome, RetrievedRule, Rule};
use crate::domain::RecordId;
use crate::infrastructure::services::{EnhancePromptRequest, EnhancedPrompt};

/// POST /v1/guidance/enhance body
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancePromptBody {
    #[serde(alias = "prompt")]
    pub junior_prompt: String,
    pub domain: String,
    #[serde(default)]
    pub project: Option<String>,
}

impl From<EnhancePromptBody> for EnhancePromptRequest {
    fn from(body: EnhancePromptBody) -> Self {
        Self {
            prompt: body.junior_prompt,
            domain: body.domain,
            project: body.project,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancePromptResponse {
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub applied_rules: Vec<RetrievedRule>,
    pub rules_count: usize,
    pub fallback_used: bool,
    pub flagged: bool,
}

impl From<EnhancedPrompt> for EnhancePromptResponse {
    fn from(enhanced: EnhancedPrompt) -> Self {
        Self {
            rules_count: enhanced.rules_count(),
            original_prompt: enhanced.original_prompt,
            enhanced_prompt: enhanced.enhanced_prompt,
            applied_rules: enhanced.applied_rules,
            fallback_used: enhanced.fallback_used,
            flagged: enhanced.flagged,
        }
    }
}

/// POST /v1/guidance/retrieve body
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRulesBody {
    pub prompt: String,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrieveRulesResponse {
    pub rules: Vec<RetrievedRule>,
    pub count: usize,
}

impl RetrieveRulesResponse {
    pub fn new(rules: Vec<RetrievedRule>) -> Self {
        Self {
            count: rules.len(),
            rules,
        }
    }
}

/// GET /v1/guidance/rules query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesQuery {
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesListResponse {
    pub count: usize,
    pub rules: Vec<Rule>,
}

impl RulesListResponse {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            count: rules.len(),
            rules,
        }
    }
}

/// Result of POST /v1/guidance/rules
#[derive(Debug, Clone, Serialize)]
pub struct IngestRuleResponse {
    pub id: RecordId,
    pub namespace: String,
    pub created: bool,
    pub status: &'static str,
}

impl From<IngestOutcome> for IngestRuleResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            status: if outcome.created { "created" } else { "exists" },
            id: outcome.id,
            namespace: outcome.namespace,
            created: outcome.created,
        }
    }
}
