//! LLM-backed hydration

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::fences::strip_code_fence;
use crate::domain::optimization::{Artifact, CodeContext, Hydrator};
use crate::domain::{AdapterPhase, DomainError, FinishReason, LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You are a code translation engine. Output only code.";

pub const DEFAULT_HYDRATION_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_HYDRATION_MAX_TOKENS: u32 = 1024;

/// Translates a context-free artifact into the caller's language through a chat model
#[derive(Debug)]
pub struct LlmHydrator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmHydrator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_HYDRATION_TEMPERATURE,
            max_tokens: DEFAULT_HYDRATION_MAX_TOKENS,
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

    fn build_prompt(artifact: &Artifact, context: &CodeContext) -> String {
        let structs = context.structs_or_classes.as_deref().unwrap_or("None");
        let variables = if context.variable_names.is_empty() {
            "None".to_string()
        } else {
            context.variable_names.join(", ")
        };

        format!(
            "You are an expert compiler and software architect.\n\
             Take the following optimal algorithm (written in {source}) and translate it into {target}.\n\n\
             PURE ALGORITHM:\n{code}\n\n\
             USER'S LOCAL CONTEXT:\n\
             Existing Structs/Classes: {structs}\n\
             Variables to map: {variables}\n\n\
             REQUIREMENTS:\n\
             - Maintain the exact time and space complexity of the pure algorithm ({complexity}).\n\
             - Adapt the logic to fit the user's provided structs and variable names.\n\
             - Output ONLY the raw executable {target} code. No markdown, no explanations.",
            source = artifact.language,
            target = context.language,
            code = artifact.optimized_code,
            complexity = artifact.time_complexity,
        )
    }
}

#[async_trait]
impl Hydrator for LlmHydrator {
    async fn hydrate(
        &self,
        artifact: &Artifact,
        context: &CodeContext,
    ) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(Self::build_prompt(artifact, context))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self
            .provider
            .chat(&self.model, request)
            .await
            .map_err(|e| e.in_phase(AdapterPhase::Hydration))?;

        // Truncated code must never reach a tier
        if response.finish_reason == Some(FinishReason::Length) {
            return Err(DomainError::adapter(
                AdapterPhase::Hydration,
                format!("Output truncated at {} tokens", self.max_tokens),
            ));
        }

        let code = strip_code_fence(response.content());
        if code.is_empty() {
            return Err(DomainError::adapter(
                AdapterPhase::Hydration,
                "Model returned no code",
            ));
        }

        debug!(
            language = %context.language,
            model = %self.model,
            chars = code.len(),
            "Hydrated artifact"
        );

        Ok(code.to_string())
    }
}
