use serde::{Deserialize, Serialize};

use crate::domain::guidance::DEFAULT_GLOBAL_DOMAIN;
use crate::domain::relevance::RelevanceConfig;
use crate::domain::DomainError;
use crate::infrastructure::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_HASHING_DIMENSIONS};
use crate::infrastructure::guidance::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS};
use crate::infrastructure::llm::{LlmProviderConfig, LlmProviderKind};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub guidance: GuidanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Calibration of the two similarity call sites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tier lookups: single best match
    #[serde(default = "RelevanceConfig::cache_lookup")]
    pub cache: RelevanceConfig,
    /// Rule retrieval: multi match
    #[serde(default = "RelevanceConfig::retrieval")]
    pub retrieval: RelevanceConfig,
    /// Serialize concurrent misses on the same fingerprint
    #[serde(default = "default_true")]
    pub single_flight: bool,
    /// Domain whose rules apply to every request
    #[serde(default = "default_global_domain")]
    pub global_domain: String,
}

/// One model role: which provider to call and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRoleConfig {
    #[serde(default)]
    pub provider: LlmProviderConfig,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "LlmRoleConfig::hydration")]
    pub hydration: LlmRoleConfig,
    #[serde(default = "LlmRoleConfig::synthesis")]
    pub synthesis: LlmRoleConfig,
    /// Optional: without an API key, rules are appended to prompts verbatim
    #[serde(default = "LlmRoleConfig::enhancement")]
    pub enhancement: LlmRoleConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    /// Offline feature hashing
    #[default]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub kind: EmbeddingKind,
    #[serde(default = "default_hashing_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Key required to ingest rules; ingestion is disabled when unset
    #[serde(default)]
    pub ingest_api_key: Option<String>,
    /// JSON array of rules ingested at startup
    #[serde(default)]
    pub seed_file: Option<String>,
    /// Enhancement attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_global_domain() -> String {
    DEFAULT_GLOBAL_DOMAIN.to_string()
}

fn default_hashing_dimensions() -> usize {
    DEFAULT_HASHING_DIMENSIONS
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: RelevanceConfig::cache_lookup(),
            retrieval: RelevanceConfig::retrieval(),
            single_flight: true,
            global_domain: default_global_domain(),
        }
    }
}

impl LlmRoleConfig {
    /// Fast model translating pure artifacts into the caller's language
    pub fn hydration() -> Self {
        Self {
            provider: LlmProviderConfig::new(LlmProviderKind::Groq, ""),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
        }
    }

    /// Reasoning model generating new artifacts
    pub fn synthesis() -> Self {
        Self {
            provider: LlmProviderConfig::new(LlmProviderKind::OpenAi, ""),
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    pub fn enhancement() -> Self {
        Self {
            provider: LlmProviderConfig::new(LlmProviderKind::Groq, ""),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.provider.api_key.trim().is_empty()
    }

    fn validate(&self, section: &str, key_required: bool) -> Result<(), DomainError> {
        if key_required && !self.has_api_key() {
            return Err(DomainError::configuration(format!(
                "{}.provider.api_key is required",
                section
            )));
        }

        if self.model.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "{}.model must not be empty",
                section
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DomainError::configuration(format!(
                "{}.temperature must be between 0 and 2, got {}",
                section, self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(DomainError::configuration(format!(
                "{}.max_tokens must be at least 1",
                section
            )));
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            hydration: LlmRoleConfig::hydration(),
            synthesis: LlmRoleConfig::synthesis(),
            enhancement: LlmRoleConfig::enhancement(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kind: EmbeddingKind::default(),
            dimensions: default_hashing_dimensions(),
            model: default_embedding_model(),
            api_key: String::new(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            ingest_api_key: None,
            seed_file: None,
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject configurations the engine cannot start with
    pub fn validate(&self) -> Result<(), DomainError> {
        self.engine.cache.validate("engine.cache")?;
        self.engine.retrieval.validate("engine.retrieval")?;

        if self.engine.global_domain.trim().is_empty() {
            return Err(DomainError::configuration(
                "engine.global_domain must not be empty",
            ));
        }

        self.llm.hydration.validate("llm.hydration", true)?;
        self.llm.synthesis.validate("llm.synthesis", true)?;
        self.llm.enhancement.validate("llm.enhancement", false)?;

        match self.embedding.kind {
            EmbeddingKind::Hashing if self.embedding.dimensions == 0 => {
                return Err(DomainError::configuration(
                    "embedding.dimensions must be at least 1",
                ));
            }
            EmbeddingKind::OpenAi if self.embedding.api_key.trim().is_empty() => {
                return Err(DomainError::configuration(
                    "embedding.api_key is required for the openai embedder",
                ));
            }
            _ => {}
        }

        if let Some(key) = &self.guidance.ingest_api_key {
            if key.trim().is_empty() {
                return Err(DomainError::configuration(
                    "guidance.ingest_api_key must not be blank when set",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.hydration.provider.api_key = "gsk-test".to_string();
        config.llm.synthesis.provider.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_defaults_match_calibration() {
        let config = AppConfig::default();

        assert_eq!(config.engine.cache, RelevanceConfig::cache_lookup());
        assert_eq!(config.engine.retrieval.distance_threshold, 1.0);
        assert_eq!(config.engine.retrieval.candidate_pool_size, 8);
        assert_eq!(config.engine.retrieval.max_results, 5);
        assert!(config.engine.single_flight);
        assert_eq!(config.engine.global_domain, "Global");
        assert_eq!(config.llm.hydration.provider.kind, LlmProviderKind::Groq);
        assert_eq!(config.embedding.kind, EmbeddingKind::Hashing);
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("llm.hydration.provider.api_key"));
    }

    #[test]
    fn test_enhancement_key_optional() {
        let config = valid();
        assert!(!config.llm.enhancement.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_calibration_rejected() {
        let mut config = valid();
        config.engine.retrieval.max_results = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("engine.retrieval.max_results"));
    }

    #[test]
    fn test_openai_embedder_needs_key() {
        let mut config = valid();
        config.embedding.kind = EmbeddingKind::OpenAi;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "engine": { "single_flight": false },
            "llm": { "hydration": {
                "provider": { "kind": "anthropic", "api_key": "k" },
                "model": "claude-3-5-haiku-latest",
                "temperature": 0.0,
                "max_tokens": 512
            }},
            "guidance": { "ingest_api_key": "secret" }
        }))
        .unwrap();

        assert!(!config.engine.single_flight);
        assert_eq!(config.engine.cache, RelevanceConfig::cache_lookup());
        assert_eq!(config.llm.hydration.provider.kind, LlmProviderKind::Anthropic);
        assert_eq!(config.llm.synthesis, LlmRoleConfig::synthesis());
        assert_eq!(config.guidance.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.server.port, 8080);
    }
}
