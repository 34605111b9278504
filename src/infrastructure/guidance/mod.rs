//! Guidance infrastructure

mod enhancer;

pub use enhancer::{
    enhancement_system_prompt, AppendRulesEnhancer, LlmPromptEnhancer, DEFAULT_ENHANCER_MAX_TOKENS,
    DEFAULT_ENHANCER_TEMPERATURE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS,
};
