//! LLM provider implementations

mod anthropic;
mod factory;
mod http_client;
mod openai;

pub use anthropic::{AnthropicProvider, DEFAULT_ANTHROPIC_BASE_URL};
pub use factory::{LlmProviderConfig, LlmProviderFactory, LlmProviderKind};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL, GROQ_BASE_URL};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
