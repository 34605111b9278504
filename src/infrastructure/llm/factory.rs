use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::http_client::HttpClient;
use super::openai::GROQ_BASE_URL;
use super::{AnthropicProvider, OpenAiProvider};
use crate::domain::{DomainError, LlmProvider};

/// Which wire protocol a provider speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// OpenAI-compatible endpoint hosted by Groq
    Groq,
    Anthropic,
}

/// Connection settings for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    #[serde(default)]
    pub kind: LlmProviderKind,
    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            kind: LlmProviderKind::default(),
            base_url: None,
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmProviderConfig {
    pub fn new(kind: LlmProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        if config.api_key.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Missing API key for {:?} provider",
                config.kind
            )));
        }

        let http_client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

        let provider: Arc<dyn LlmProvider> = match config.kind {
            LlmProviderKind::OpenAi => match &config.base_url {
                Some(url) => Arc::new(OpenAiProvider::with_base_url(
                    http_client,
                    &config.api_key,
                    url,
                )),
                None => Arc::new(OpenAiProvider::new(http_client, &config.api_key)),
            },

            LlmProviderKind::Groq => {
                let url = config.base_url.as_deref().unwrap_or(GROQ_BASE_URL);
                Arc::new(
                    OpenAiProvider::with_base_url(http_client, &config.api_key, url)
                        .with_name("groq"),
                )
            }

            LlmProviderKind::Anthropic => match &config.base_url {
                Some(url) => Arc::new(AnthropicProvider::with_base_url(
                    http_client,
                    &config.api_key,
                    url,
                )),
                None => Arc::new(AnthropicProvider::new(http_client, &config.api_key)),
            },
        };

        Ok(provider)
    }
}
