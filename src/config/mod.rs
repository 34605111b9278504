//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, EmbeddingKind, EngineConfig, GuidanceConfig, LlmConfig,
    LlmRoleConfig, LogFormat, LoggingConfig, ServerConfig,
};
