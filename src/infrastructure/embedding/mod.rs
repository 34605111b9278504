//! Embedding provider implementations

mod hashing;
mod openai;

pub use hashing::{HashingEmbeddingProvider, DEFAULT_HASHING_DIMENSIONS};
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL};

pub use super::llm::{HttpClient, HttpClientTrait};
