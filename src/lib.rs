//! OptiEngine
//!
//! Tiered semantic cache and relevance-filtered retrieval:
//! - Code optimization served from per-organization and shared tiers,
//!   synthesized and hydrated by chat models on a full miss
//! - Organizational rules retrieved by relevance and enforced on prompts

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::embedding::EmbeddingProvider;
use domain::guidance::{PromptEnhancer, RuleRetriever};
use domain::optimization::{standard_tiers, TieredCacheOrchestrator};
use domain::similarity::SimilarityStore;
use domain::LlmProvider;
use infrastructure::embedding::{HashingEmbeddingProvider, HttpClient, OpenAiEmbeddingProvider};
use infrastructure::guidance::{AppendRulesEnhancer, LlmPromptEnhancer};
use infrastructure::llm::LlmProviderFactory;
use infrastructure::optimization::{LlmHydrator, LlmSynthesizer};
use infrastructure::services::GuidanceService;
use infrastructure::store::InMemorySimilarityStore;
use tracing::{info, warn};

use crate::config::{EmbeddingConfig, EmbeddingKind, LlmRoleConfig};

/// Create the application state with all services initialized
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let embedder = create_embedding_provider(&config.embedding)?;
    info!(
        provider = embedder.provider_name(),
        model = embedder.model(),
        "Embedding provider ready"
    );

    let store: Arc<dyn SimilarityStore> = Arc::new(InMemorySimilarityStore::new(embedder));

    let hydrator = LlmHydrator::new(create_llm(&config.llm.hydration)?, &config.llm.hydration.model)
        .with_temperature(config.llm.hydration.temperature)
        .with_max_tokens(config.llm.hydration.max_tokens);

    let synthesizer =
        LlmSynthesizer::new(create_llm(&config.llm.synthesis)?, &config.llm.synthesis.model)
            .with_temperature(config.llm.synthesis.temperature)
            .with_max_tokens(config.llm.synthesis.max_tokens);

    let orchestrator = TieredCacheOrchestrator::new(
        store.clone(),
        standard_tiers(&config.engine.cache),
        Arc::new(hydrator),
        Arc::new(synthesizer),
    )
    .with_single_flight(config.engine.single_flight);

    let retriever = RuleRetriever::new(store.clone(), config.engine.retrieval.clone())
        .with_global_domain(&config.engine.global_domain);
    let guidance = GuidanceService::new(retriever, create_enhancer(config)?);

    info!(
        tiers = orchestrator.tiers().len(),
        single_flight = config.engine.single_flight,
        store = store.store_name(),
        "Engine initialized"
    );

    Ok(
        AppState::new(Arc::new(orchestrator), Arc::new(guidance), store)
            .with_ingest_api_key(config.guidance.ingest_api_key.clone()),
    )
}

fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.kind {
        EmbeddingKind::Hashing => Arc::new(HashingEmbeddingProvider::new(config.dimensions)?),
        EmbeddingKind::OpenAi => {
            let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
            let provider = match &config.base_url {
                Some(url) => OpenAiEmbeddingProvider::with_base_url(client, &config.api_key, url),
                None => OpenAiEmbeddingProvider::new(client, &config.api_key),
            };
            Arc::new(provider.with_model(&config.model))
        }
    };

    Ok(provider)
}

fn create_llm(role: &LlmRoleConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    Ok(LlmProviderFactory::create(&role.provider)?)
}

fn create_enhancer(config: &AppConfig) -> anyhow::Result<Arc<dyn PromptEnhancer>> {
    let role = &config.llm.enhancement;

    if !role.has_api_key() {
        warn!("No enhancement model configured, rules will be appended verbatim");
        return Ok(Arc::new(AppendRulesEnhancer));
    }

    let enhancer = LlmPromptEnhancer::new(create_llm(role)?, &role.model)
        .with_temperature(role.temperature)
        .with_max_tokens(role.max_tokens)
        .with_retry_config(
            config.guidance.max_retries,
            Duration::from_millis(config.guidance.retry_base_delay_ms),
        );

    Ok(Arc::new(enhancer))
}
