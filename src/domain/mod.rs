//! Domain layer - Core engine logic and entities

pub mod embedding;
pub mod error;
pub mod guidance;
pub mod llm;
pub mod optimization;
pub mod relevance;
pub mod similarity;
pub mod tier;

pub use error::{AdapterPhase, DomainError};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    ResponseFormat, Usage,
};
pub use relevance::{Candidate, RelevanceConfig, RelevanceFilter, RelevanceOutcome, RelevanceQuery};
pub use similarity::{CacheRecord, InsertOutcome, RecordId, ScoredRecord, SimilarityStore};
