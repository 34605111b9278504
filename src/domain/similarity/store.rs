//! Similarity store trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::record::{CacheRecord, InsertOutcome, RecordId, ScoredRecord};
use crate::domain::DomainError;

/// Nearest-neighbour store partitioned into namespaces
///
/// Writes are append-only: `insert` never replaces a record that shares an
/// existing id.
#[async_trait]
pub trait SimilarityStore: Send + Sync + Debug {
    /// Return up to `k` records of `namespace` ordered by ascending distance to `text`
    async fn query(
        &self,
        namespace: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError>;

    /// Insert the record unless its id is already present in its namespace
    async fn insert(&self, record: CacheRecord) -> Result<InsertOutcome, DomainError>;

    /// Check whether a record id exists in the namespace
    async fn exists(&self, namespace: &str, id: &RecordId) -> Result<bool, DomainError>;

    /// Number of records in the namespace
    async fn count(&self, namespace: &str) -> Result<usize, DomainError>;

    /// Fetch a record by id
    async fn get(&self, namespace: &str, id: &RecordId)
        -> Result<Option<CacheRecord>, DomainError>;

    /// All records of the namespace in insertion order
    async fn list(&self, namespace: &str) -> Result<Vec<CacheRecord>, DomainError>;

    /// Names of all non-empty namespaces
    async fn namespaces(&self) -> Result<Vec<String>, DomainError>;

    /// Name of the store implementation
    fn store_name(&self) -> &'static str;
}
