//! LLM-backed synthesis

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::fences::{extract_json_object, strip_code_fence};
use crate::domain::optimization::{OptimizeRequest, SynthesizedArtifact, Synthesizer, PURE_LANGUAGE};
use crate::domain::{AdapterPhase, DomainError, LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You are an elite competitive programmer. \
                             You answer with a single JSON object and nothing else.";

pub const DEFAULT_SYNTHESIS_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_SYNTHESIS_MAX_TOKENS: u32 = 2048;

/// Shape the synthesis model must answer with
#[derive(Debug, Deserialize)]
struct SynthesisOutput {
    time_complexity: String,
    pure_cpp_code: String,
}

/// Generates a context-free optimal solution through a reasoning model
#[derive(Debug)]
pub struct LlmSynthesizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_SYNTHESIS_TEMPERATURE,
            max_tokens: DEFAULT_SYNTHESIS_MAX_TOKENS,
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

    fn build_prompt(request: &OptimizeRequest) -> String {
        let existing = if request.context.existing_code.trim().is_empty() {
            "(none provided)"
        } else {
            request.context.existing_code.as_str()
        };

        format!(
            "The user is trying to solve this problem: {intent}\n\n\
             Their current naive approach is written in {language}:\n{existing}\n\n\
             TASK:\n\
             1. Determine the mathematically optimal time and space complexity for this problem.\n\
             2. Write the pure, highly optimized solution in {pure}.\n\
             3. Return ONLY a JSON object with this exact structure:\n\
             {{\"time_complexity\": \"O(...)\", \"pure_cpp_code\": \"...\"}}",
            intent = request.intent,
            language = request.context.language,
            pure = PURE_LANGUAGE,
        )
    }
}

/// Validate the model's answer against the expected JSON shape
pub fn parse_synthesis_output(raw: &str) -> Result<SynthesizedArtifact, DomainError> {
    let unfenced = strip_code_fence(raw);
    let json = extract_json_object(unfenced).ok_or_else(|| {
        DomainError::adapter(AdapterPhase::Synthesis, "Model output contains no JSON object")
    })?;

    let output: SynthesisOutput = serde_json::from_str(json).map_err(|e| {
        DomainError::adapter(
            AdapterPhase::Synthesis,
            format!("Model output does not match the expected shape: {}", e),
        )
    })?;

    let code = output.pure_cpp_code.trim();
    let complexity = output.time_complexity.trim();

    if code.is_empty() || complexity.is_empty() {
        return Err(DomainError::adapter(
            AdapterPhase::Synthesis,
            "Model output has an empty pure_cpp_code or time_complexity",
        ));
    }

    Ok(SynthesizedArtifact::new(code, complexity))
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(
        &self,
        request: &OptimizeRequest,
    ) -> Result<SynthesizedArtifact, DomainError> {
        let llm_request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(Self::build_prompt(request))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .json_object()
            .build();

        let response = self
            .provider
            .chat(&self.model, llm_request)
            .await
            .map_err(|e| e.in_phase(AdapterPhase::Synthesis))?;

        let artifact = parse_synthesis_output(response.content()).inspect_err(|e| {
            warn!(model = %self.model, error = %e, "Discarding malformed synthesis output");
        })?;

        debug!(
            model = %self.model,
            time_complexity = %artifact.time_complexity,
            "Synthesized artifact"
        );

        Ok(artifact)
    }
}
