//! Similarity store domain
//!
//! The engine treats the nearest-neighbour index as an injected collaborator.
//! Records are append-only and identified by a content fingerprint.

mod record;
mod store;

pub use record::{normalize_key, CacheRecord, InsertOutcome, RecordId, ScoredRecord};
pub use store::SimilarityStore;

#[cfg(test)]
pub use store::mock::MockSimilarityStore;
