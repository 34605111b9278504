//! Guidance service - rule ingestion, retrieval and prompt enhancement

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::domain::guidance::{
    sanitize_prompt, IngestOutcome, IngestRuleRequest, PromptEnhancer, RetrievedRule, Rule,
    RuleRetriever,
};
use crate::domain::optimization::{non_blank, validation_error};
use crate::domain::DomainError;

/// Request to enforce organizational rules on a developer prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EnhancePromptRequest {
    #[validate(custom(function = "non_blank"))]
    pub prompt: String,
    #[validate(custom(function = "non_blank"))]
    pub domain: String,
    /// Restricts rules to this project plus the ones that apply to every project
    #[serde(default)]
    pub project: Option<String>,
}

impl EnhancePromptRequest {
    pub fn new(prompt: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            domain: domain.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Prompt after sanitizing and rule enforcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedPrompt {
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub applied_rules: Vec<RetrievedRule>,
    /// Rules were appended verbatim because the rewriting model was unavailable
    pub fallback_used: bool,
    /// The prompt contained an injection attempt that was redacted
    pub flagged: bool,
}

impl EnhancedPrompt {
    pub fn rules_count(&self) -> usize {
        self.applied_rules.len()
    }
}

/// Result of a bulk ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub created: usize,
    pub existing: usize,
}

/// Guidance service orchestrating sanitizing, retrieval and enhancement
#[derive(Debug, Clone)]
pub struct GuidanceService {
    retriever: RuleRetriever,
    enhancer: Arc<dyn PromptEnhancer>,
}

impl GuidanceService {
    pub fn new(retriever: RuleRetriever, enhancer: Arc<dyn PromptEnhancer>) -> Self {
        Self {
            retriever,
            enhancer,
        }
    }

    pub fn retriever(&self) -> &RuleRetriever {
        &self.retriever
    }

    /// Sanitize a prompt, retrieve the rules relevant to it and enforce them
    pub async fn enhance(
        &self,
        request: EnhancePromptRequest,
    ) -> Result<EnhancedPrompt, DomainError> {
        request.validate().map_err(validation_error)?;

        let sanitized = sanitize_prompt(&request.prompt);
        let rules = self
            .retriever
            .retrieve_rules_in_project(
                &sanitized.text,
                &request.domain,
                request.project.as_deref(),
            )
            .await?;

        if rules.is_empty() {
            info!(domain = %request.domain, "No relevant rules, prompt passed through");
            return Ok(EnhancedPrompt {
                original_prompt: request.prompt,
                enhanced_prompt: sanitized.text,
                applied_rules: Vec::new(),
                fallback_used: false,
                flagged: sanitized.flagged,
            });
        }

        let plain_rules: Vec<Rule> = rules.iter().map(|r| r.rule.clone()).collect();
        let enhancement = self.enhancer.enhance(&sanitized.text, &plain_rules).await?;

        info!(
            domain = %request.domain,
            rules_applied = rules.len(),
            fallback_used = enhancement.fallback_used,
            flagged = sanitized.flagged,
            "Prompt enhancement complete"
        );

        Ok(EnhancedPrompt {
            original_prompt: request.prompt,
            enhanced_prompt: enhancement.prompt,
            applied_rules: rules,
            fallback_used: enhancement.fallback_used,
            flagged: sanitized.flagged,
        })
    }

    /// Rules relevant to a prompt without rewriting it
    pub async fn retrieve(
        &self,
        prompt: &str,
        domain: &str,
    ) -> Result<Vec<RetrievedRule>, DomainError> {
        non_blank(prompt)
            .map_err(|_| DomainError::validation("Invalid request: prompt must not be blank"))?;
        self.retriever.retrieve_rules(prompt, domain).await
    }

    pub async fn ingest(&self, request: IngestRuleRequest) -> Result<IngestOutcome, DomainError> {
        self.retriever.ingest(request).await
    }

    /// Ingest many rules, stopping at the first invalid one
    pub async fn ingest_all(
        &self,
        requests: Vec<IngestRuleRequest>,
    ) -> Result<SeedSummary, DomainError> {
        let mut summary = SeedSummary::default();

        for request in requests {
            if self.ingest(request).await?.created {
                summary.created += 1;
            } else {
                summary.existing += 1;
            }
        }

        Ok(summary)
    }

    /// Ingest a JSON array of rules from disk
    pub async fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<SeedSummary, DomainError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.display(),
                e
            ))
        })?;

        let requests: Vec<IngestRuleRequest> = serde_json::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid seed file {}: {}",
                path.display(),
                e
            ))
        })?;

        let summary = self.ingest_all(requests).await?;

        if summary.created == 0 && summary.existing == 0 {
            warn!(path = %path.display(), "Seed file contained no rules");
        } else {
            info!(
                path = %path.display(),
                created = summary.created,
                existing = summary.existing,
                "Seeded guidance rules"
            );
        }

        Ok(summary)
    }

    pub async fn list(&self, domain: Option<&str>) -> Result<Vec<Rule>, DomainError> {
        self.retriever.list(domain).await
    }
}
