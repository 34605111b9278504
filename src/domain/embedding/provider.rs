//! Embedding provider trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Turns text into fixed-length vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a batch of texts, one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            DomainError::provider(self.provider_name(), "Embedding response was empty")
        })
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Model used for embedding
    fn model(&self) -> &str;

    /// Vector length, when known up front
    fn dimensions(&self) -> Option<usize>;
}
