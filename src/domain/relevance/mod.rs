//! Relevance filtering over similarity candidates
//!
//! Shared by artifact lookup (single best match) and rule retrieval
//! (multi match). A threshold miss is a normal outcome, not an error.

mod config;
mod filter;
mod query;

pub use config::RelevanceConfig;
pub use filter::{
    closest_distance, distance_distribution, Candidate, RelevanceFilter, RelevanceOutcome,
};
pub use query::{gather_candidates, query_namespace, search, search_where, RelevanceQuery};
