//! Offline embedding by feature hashing
//!
//! Each lowercase alphanumeric token and each adjacent token pair is hashed
//! with FNV-1a into a fixed number of buckets, with the sign taken from a
//! high bit of the hash. The result is L2-normalized, so texts that share no
//! tokens sit at cosine distance 1.0 and identical texts at 0.0.

use async_trait::async_trait;

use crate::domain::embedding::{normalize, EmbeddingProvider};
use crate::domain::DomainError;

pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a token pair relative to a single token
const BIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Deterministic bag-of-words embedder that needs no network
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::configuration(
                "Hashing embedder needs at least one dimension",
            ));
        }
        Ok(Self { dimensions })
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        let tokens = tokenize(text);

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_HASHING_DIMENSIONS,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn model(&self) -> &str {
        "fnv1a-bag-of-words"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{cosine_distance, l2_norm};

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashingEmbeddingProvider::default();

        let a = embedder.embed_text("Sort a list of integers");
        let b = embedder.embed_text("Sort a list of integers");

        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HASHING_DIMENSIONS);
        assert!((l2_norm(&a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashingEmbeddingProvider::default();

        let a = embedder.embed_text("Binary search, iterative!");
        let b = embedder.embed_text("binary SEARCH iterative");

        assert!(cosine_distance(&a, &b) < 1e-5);
    }

    #[test]
    fn test_related_texts_are_closer() {
        let embedder = HashingEmbeddingProvider::default();

        let query = embedder.embed_text("sort a list of numbers quickly");
        let related = embedder.embed_text("sort a list of numbers");
        let unrelated = embedder.embed_text("parse http headers from socket");

        assert!(cosine_distance(&query, &related) < cosine_distance(&query, &unrelated));
        assert!(cosine_distance(&query, &related) < 1.0);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbeddingProvider::new(8).unwrap();
        assert!(embedder.embed_text("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbeddingProvider::new(0).is_err());
    }

    #[tokio::test]
    async fn test_batch_embedding() {
        let embedder = HashingEmbeddingProvider::new(32).unwrap();
        let texts = vec!["one".to_string(), "two".to_string()];

        let vectors = embedder.embed(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embedder.embed_text("one"));
        assert_eq!(embedder.dimensions(), Some(32));
    }
}
