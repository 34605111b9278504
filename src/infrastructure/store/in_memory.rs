//! In-memory similarity store for development and single-node deployments

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::embedding::{cosine_distance, EmbeddingProvider};
use crate::domain::{CacheRecord, DomainError, InsertOutcome, RecordId, ScoredRecord, SimilarityStore};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: CacheRecord,
    embedding: Vec<f32>,
}

/// Brute-force cosine search over embedded records, grouped by namespace
#[derive(Debug)]
pub struct InMemorySimilarityStore {
    embedder: Arc<dyn EmbeddingProvider>,
    namespaces: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl InMemorySimilarityStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// An embedder outage makes the store unusable, so it surfaces as one
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embedder.embed_one(text).await.map_err(|e| {
            DomainError::store_unavailable(format!(
                "Embedding provider '{}' failed: {}",
                self.embedder.provider_name(),
                e
            ))
        })
    }
}

#[async_trait]
impl SimilarityStore for InMemorySimilarityStore {
    async fn query(
        &self,
        namespace: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        if k == 0 || self.count(namespace).await? == 0 {
            return Ok(Vec::new());
        }

        let probe = self.embed(text).await?;

        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredRecord> = records
            .iter()
            .map(|stored| {
                ScoredRecord::new(
                    stored.record.clone(),
                    cosine_distance(&probe, &stored.embedding),
                )
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);

        Ok(scored)
    }

    async fn insert(&self, record: CacheRecord) -> Result<InsertOutcome, DomainError> {
        if self.exists(record.namespace(), record.id()).await? {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        let embedding = self.embed(record.query_text()).await?;

        let mut namespaces = self.namespaces.write().await;
        let records = namespaces.entry(record.namespace().to_string()).or_default();

        // A concurrent writer may have won while we were embedding
        if records.iter().any(|s| s.record.id() == record.id()) {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        debug!(
            namespace = %record.namespace(),
            id = %record.id(),
            "Stored record"
        );
        records.push(StoredRecord { record, embedding });

        Ok(InsertOutcome::Inserted)
    }

    async fn exists(&self, namespace: &str, id: &RecordId) -> Result<bool, DomainError> {
        Ok(self.get(namespace, id).await?.is_some())
    }

    async fn count(&self, namespace: &str) -> Result<usize, DomainError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).map_or(0, Vec::len))
    }

    async fn get(
        &self,
        namespace: &str,
        id: &RecordId,
    ) -> Result<Option<CacheRecord>, DomainError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|records| records.iter().find(|s| s.record.id() == id))
            .map(|s| s.record.clone()))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<CacheRecord>, DomainError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|records| records.iter().map(|s| s.record.clone()).collect())
            .unwrap_or_default())
    }

    async fn namespaces(&self) -> Result<Vec<String>, DomainError> {
        let namespaces = self.namespaces.read().await;
        let mut names: Vec<String> = namespaces
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn store_name(&self) -> &'static str {
        "in_memory"
    }
}
