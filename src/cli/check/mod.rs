//! Check-config command - validates configuration without starting the server

use anyhow::Context;
use serde::Serialize;

use crate::config::{AppConfig, EmbeddingKind, EngineConfig, LlmRoleConfig};
use crate::infrastructure::llm::LlmProviderKind;

/// Resolved settings, without credentials
#[derive(Debug, Serialize)]
struct ConfigSummary<'a> {
    engine: &'a EngineConfig,
    embedding: EmbeddingKind,
    hydration: RoleSummary<'a>,
    synthesis: RoleSummary<'a>,
    enhancement: RoleSummary<'a>,
    ingestion_enabled: bool,
    seed_file: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RoleSummary<'a> {
    provider: LlmProviderKind,
    model: &'a str,
    configured: bool,
}

impl<'a> From<&'a LlmRoleConfig> for RoleSummary<'a> {
    fn from(role: &'a LlmRoleConfig) -> Self {
        Self {
            provider: role.provider.kind,
            model: &role.model,
            configured: role.has_api_key(),
        }
    }
}

fn summarize(config: &AppConfig) -> ConfigSummary<'_> {
    ConfigSummary {
        engine: &config.engine,
        embedding: config.embedding.kind,
        hydration: (&config.llm.hydration).into(),
        synthesis: (&config.llm.synthesis).into(),
        enhancement: (&config.llm.enhancement).into(),
        ingestion_enabled: config.guidance.ingest_api_key.is_some(),
        seed_file: config.guidance.seed_file.as_deref(),
    }
}

/// Load and validate the configuration, then print what the engine would run with
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;

    println!("{}", serde_json::to_string_pretty(&summarize(&config))?);

    Ok(())
}
