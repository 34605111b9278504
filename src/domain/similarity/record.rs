//! Records held by the similarity store

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Deterministic content fingerprint of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Number of hex characters kept from the digest
    pub const LENGTH: usize = 24;

    /// Fingerprint the given key fields.
    ///
    /// Fields are normalized before hashing, so casing and whitespace
    /// differences map to the same id.
    pub fn fingerprint<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|p| normalize_key(p.as_ref()))
            .collect::<Vec<_>>()
            .join(":");

        let digest = Sha256::digest(joined.as_bytes());
        let mut encoded = hex::encode(digest);
        encoded.truncate(Self::LENGTH);

        Self(encoded)
    }

    /// Wrap an id read back from storage
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a key field: trim, lowercase and collapse inner whitespace
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// An immutable record in one namespace of the similarity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    id: RecordId,
    namespace: String,
    /// Text that was embedded to index this record
    query_text: String,
    /// Caller-defined metadata
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(
        namespace: impl Into<String>,
        id: RecordId,
        query_text: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            query_text: query_text.into(),
            payload,
            created_at: Utc::now(),
        }
    }

    /// Build a record from a serializable payload
    pub fn from_payload<T: Serialize>(
        namespace: impl Into<String>,
        id: RecordId,
        query_text: impl Into<String>,
        payload: &T,
    ) -> Result<Self, DomainError> {
        let value = serde_json::to_value(payload).map_err(|e| {
            DomainError::internal(format!("Failed to serialize record payload: {}", e))
        })?;

        Ok(Self::new(namespace, id, query_text, value))
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// String field of the payload, if present
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(|v| v.as_str())
    }

    /// Deserialize the payload into a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::internal(format!(
                "Record {} in '{}' has an unexpected payload: {}",
                self.id, self.namespace, e
            ))
        })
    }
}

/// A record returned by a similarity query, annotated with its distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: CacheRecord,
    /// Non-negative dissimilarity, 0 means identical
    pub distance: f32,
}

impl ScoredRecord {
    pub fn new(record: CacheRecord, distance: f32) -> Self {
        Self { record, distance }
    }
}

/// Result of an insert-if-absent write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}
