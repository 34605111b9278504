//! Generative adapters backed by chat models

mod fences;
mod hydration;
mod synthesis;

pub use fences::{extract_json_object, strip_code_fence};
pub use hydration::{LlmHydrator, DEFAULT_HYDRATION_MAX_TOKENS, DEFAULT_HYDRATION_TEMPERATURE};
pub use synthesis::{
    parse_synthesis_output, LlmSynthesizer, DEFAULT_SYNTHESIS_MAX_TOKENS,
    DEFAULT_SYNTHESIS_TEMPERATURE,
};
