//! LLM-backed prompt enhancement with retry and plain-text fallback

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::guidance::{fallback_prompt, rules_block, Enhancement, PromptEnhancer, Rule};
use crate::domain::{DomainError, LlmProvider, LlmRequest};

pub const DEFAULT_ENHANCER_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_ENHANCER_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

const SYSTEM_PROMPT_HEADER: &str = "\
You are a Staff Engineer intercepting a junior developer's code generation prompt.

Your task is to rewrite their prompt into a precise, detailed engineering specification \
that explicitly enforces all mandatory organizational rules listed below.

REWRITING RULES:
1. Every [MANDATORY] rule MUST appear in your output as a hard, non-negotiable requirement.
2. Use strong directive language: MUST, REQUIRED, NON-NEGOTIABLE, ENFORCE.
3. Do NOT soften, summarize, or omit any rule. If a rule says \"use RS256\", the output must say \"use RS256\".
4. Preserve the developer's original intent completely. Only add requirements, never remove them.
5. The output must be self-contained. The downstream coding agent must need nothing else to generate fully compliant code.
6. Output ONLY the rewritten prompt. No preamble, no explanation.

MANDATORY ORGANIZATIONAL RULES:
";

/// System prompt instructing the model to weave `rules` into the developer's prompt
pub fn enhancement_system_prompt(rules: &[Rule]) -> String {
    format!("{}{}\n", SYSTEM_PROMPT_HEADER, rules_block(rules))
}

/// Rewrites prompts through a chat model, degrading to appended rules
#[derive(Debug)]
pub struct LlmPromptEnhancer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    /// Attempts after the first one
    max_retries: u32,
    retry_base_delay: Duration,
}

impl LlmPromptEnhancer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_ENHANCER_TEMPERATURE,
            max_tokens: DEFAULT_ENHANCER_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry_config(mut self, max_retries: u32, retry_base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = retry_base_delay;
        self
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn rewrite(&self, system_prompt: &str, prompt: &str) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(system_prompt)
            .user(prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self.provider.chat(&self.model, request).await?;
        let rewritten = response.content().trim();

        if rewritten.is_empty() {
            return Err(DomainError::provider(
                self.provider.provider_name(),
                "Model returned an empty prompt",
            ));
        }

        Ok(rewritten.to_string())
    }
}

#[async_trait]
impl PromptEnhancer for LlmPromptEnhancer {
    async fn enhance(&self, prompt: &str, rules: &[Rule]) -> Result<Enhancement, DomainError> {
        if rules.is_empty() {
            info!("No rules to enforce, returning prompt unchanged");
            return Ok(Enhancement {
                prompt: prompt.to_string(),
                fallback_used: false,
            });
        }

        let system_prompt = enhancement_system_prompt(rules);
        let attempts = self.max_retries + 1;

        for attempt in 0..attempts {
            match self.rewrite(&system_prompt, prompt).await {
                Ok(rewritten) => {
                    info!(
                        model = %self.model,
                        rules_injected = rules.len(),
                        attempt = attempt + 1,
                        "Prompt enhanced"
                    );
                    return Ok(Enhancement {
                        prompt: rewritten,
                        fallback_used: false,
                    });
                }
                Err(e) if attempt + 1 < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Enhancement call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        max_attempts = attempts,
                        error = %e,
                        "All enhancement attempts failed"
                    );
                }
            }
        }

        warn!(rules = rules.len(), "Falling back to raw rule injection");
        Ok(Enhancement {
            prompt: fallback_prompt(prompt, rules),
            fallback_used: true,
        })
    }
}

/// Enhancer used when no rewriting model is configured
#[derive(Debug, Default)]
pub struct AppendRulesEnhancer;

#[async_trait]
impl PromptEnhancer for AppendRulesEnhancer {
    async fn enhance(&self, prompt: &str, rules: &[Rule]) -> Result<Enhancement, DomainError> {
        if rules.is_empty() {
            return Ok(Enhancement {
                prompt: prompt.to_string(),
                fallback_used: false,
            });
        }

        Ok(Enhancement {
            prompt: fallback_prompt(prompt, rules),
            fallback_used: true,
        })
    }
}
