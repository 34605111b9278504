//! Organizational rules

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::optimization::{non_blank, validation_error};
use crate::domain::similarity::{normalize_key, RecordId};
use crate::domain::DomainError;

/// Namespace prefix of rule collections
pub const RULE_NAMESPACE_PREFIX: &str = "guidelines";

/// Project value for rules that apply to every project of a domain
pub const ALL_PROJECTS: &str = "All";

/// Namespace holding the rules of a domain
pub fn rule_namespace(domain: &str) -> String {
    format!("{}:{}", RULE_NAMESPACE_PREFIX, normalize_key(domain))
}

/// Domain encoded in a rule namespace, if it is one
pub fn namespace_domain(namespace: &str) -> Option<&str> {
    namespace
        .strip_prefix(RULE_NAMESPACE_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
}

/// Whether a rule scoped to `rule_project` applies to a request for `project`
pub fn project_matches(rule_project: &str, project: &str) -> bool {
    let all = normalize_key(ALL_PROJECTS);
    let rule_project = normalize_key(rule_project);
    let project = normalize_key(project);
    rule_project == all || project == all || rule_project == project
}

fn default_project() -> String {
    ALL_PROJECTS.to_string()
}

/// A rule as stored in the similarity store payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub domain: String,
    #[serde(default = "default_project")]
    pub project: String,
    pub topic: String,
    pub rule_text: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl Rule {
    /// Deterministic id: same domain, project and text always map to one record
    pub fn record_id(&self) -> RecordId {
        RecordId::fingerprint([&self.domain, &self.project, &self.rule_text])
    }

    /// Text indexed for similarity search
    pub fn document_text(&self) -> String {
        format!("{}: {}", self.topic.trim(), self.rule_text.trim())
    }

    pub fn namespace(&self) -> String {
        rule_namespace(&self.domain)
    }

    /// Deduplication key across namespaces
    pub fn content_key(&self) -> String {
        normalize_key(&self.rule_text)
    }

    pub fn applies_to_project(&self, project: &str) -> bool {
        project_matches(&self.project, project)
    }
}

/// Request to add a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IngestRuleRequest {
    #[validate(custom(function = "non_blank"))]
    pub domain: String,
    #[serde(default = "default_project")]
    #[validate(custom(function = "non_blank"))]
    pub project: String,
    #[validate(custom(function = "non_blank"))]
    pub topic: String,
    #[validate(custom(function = "non_blank"))]
    pub rule_text: String,
}

impl IngestRuleRequest {
    pub fn new(
        domain: impl Into<String>,
        topic: impl Into<String>,
        rule_text: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            project: default_project(),
            topic: topic.into(),
            rule_text: rule_text.into(),
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Validate and build the stored rule
    pub fn into_rule(self) -> Result<Rule, DomainError> {
        self.validate().map_err(validation_error)?;

        Ok(Rule {
            domain: self.domain.trim().to_string(),
            project: self.project.trim().to_string(),
            topic: self.topic.trim().to_string(),
            rule_text: self.rule_text.trim().to_string(),
            version: default_version(),
        })
    }
}

/// Result of ingesting a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub id: RecordId,
    pub namespace: String,
    /// False when the rule was already present
    pub created: bool,
}

/// A rule selected for a prompt, with its distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRule {
    #[serde(flatten)]
    pub rule: Rule,
    pub distance: f32,
}
