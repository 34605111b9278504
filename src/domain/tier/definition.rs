//! Tier definitions

use serde::{Deserialize, Serialize};

use crate::domain::relevance::RelevanceConfig;

/// Which namespace a tier reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    /// One namespace per caller: `<prefix>:<caller id>`
    PerCaller(String),
    /// A single namespace shared by every caller
    Shared(String),
}

impl NamespaceScope {
    /// Resolve the namespace for a caller
    pub fn resolve(&self, caller_id: &str) -> String {
        match self {
            Self::PerCaller(prefix) => format!("{}:{}", prefix, caller_id.trim()),
            Self::Shared(namespace) => namespace.clone(),
        }
    }

    pub fn is_per_caller(&self) -> bool {
        matches!(self, Self::PerCaller(_))
    }
}

/// How a tier decides whether its candidates are a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptancePolicy {
    /// Only the closest candidate is considered
    SingleBestMatch,
    /// Every candidate that passes the relevance filter is returned
    MultiMatch,
}

/// Whether a stored artifact is already specialized to the caller's context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactForm {
    /// Context-free, reusable across callers
    Pure,
    /// Specialized to a language and context
    Hydrated,
}

/// One knowledge tier
#[derive(Debug, Clone, PartialEq)]
pub struct TierDefinition {
    pub name: String,
    pub scope: NamespaceScope,
    pub policy: AcceptancePolicy,
    pub calibration: RelevanceConfig,
    /// Payload fields that must equal the request's values for a hit
    pub match_fields: Vec<String>,
    pub form: ArtifactForm,
}

impl TierDefinition {
    pub fn new(name: impl Into<String>, scope: NamespaceScope, form: ArtifactForm) -> Self {
        Self {
            name: name.into(),
            scope,
            policy: AcceptancePolicy::SingleBestMatch,
            calibration: RelevanceConfig::cache_lookup(),
            match_fields: Vec::new(),
            form,
        }
    }

    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_calibration(mut self, calibration: RelevanceConfig) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_match_field(mut self, field: impl Into<String>) -> Self {
        self.match_fields.push(field.into());
        self
    }

    pub fn namespace_for(&self, caller_id: &str) -> String {
        self.scope.resolve(caller_id)
    }
}
