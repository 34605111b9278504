//! Candidate gathering across namespaces

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::config::RelevanceConfig;
use super::filter::{distance_distribution, Candidate, RelevanceFilter, RelevanceOutcome};
use crate::domain::similarity::{CacheRecord, ScoredRecord, SimilarityStore};
use crate::domain::DomainError;

/// One similarity search, built per call
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceQuery {
    pub query_text: String,
    /// Namespaces searched; earlier namespaces win distance ties
    pub namespaces: Vec<String>,
    pub candidate_pool_size: usize,
    pub distance_threshold: f32,
    pub max_results: usize,
}

impl RelevanceQuery {
    pub fn new(
        query_text: impl Into<String>,
        namespaces: Vec<String>,
        config: &RelevanceConfig,
    ) -> Self {
        Self {
            query_text: query_text.into(),
            namespaces,
            candidate_pool_size: config.candidate_pool_size,
            distance_threshold: config.distance_threshold,
            max_results: config.max_results,
        }
    }

    pub fn filter(&self) -> RelevanceFilter {
        RelevanceFilter::new(self.distance_threshold, self.max_results)
    }
}

/// Query one namespace, asking for no more neighbours than it holds
pub async fn query_namespace(
    store: &dyn SimilarityStore,
    namespace: &str,
    text: &str,
    pool_size: usize,
) -> Result<Vec<ScoredRecord>, DomainError> {
    let count = store.count(namespace).await?;
    if count == 0 {
        debug!(namespace = %namespace, "Namespace is empty, skipping query");
        return Ok(Vec::new());
    }

    let k = pool_size.min(count);
    store.query(namespace, text, k).await
}

/// Query every namespace of the request concurrently and concatenate the results
/// in namespace order
pub async fn gather_candidates(
    store: &dyn SimilarityStore,
    query: &RelevanceQuery,
) -> Result<Vec<ScoredRecord>, DomainError> {
    let per_namespace = try_join_all(query.namespaces.iter().map(|namespace| {
        query_namespace(
            store,
            namespace,
            &query.query_text,
            query.candidate_pool_size,
        )
    }))
    .await?;

    Ok(per_namespace.into_iter().flatten().collect())
}

/// Gather, log and filter candidates for a query
///
/// `content_key` extracts the deduplication key from a record.
pub async fn search<F>(
    store: &dyn SimilarityStore,
    query: &RelevanceQuery,
    content_key: F,
) -> Result<RelevanceOutcome<CacheRecord>, DomainError>
where
    F: Fn(&CacheRecord) -> String,
{
    search_where(store, query, content_key, |_| true).await
}

/// Like [`search`], but drops records rejected by `keep` before the result cap applies
pub async fn search_where<F, P>(
    store: &dyn SimilarityStore,
    query: &RelevanceQuery,
    content_key: F,
    keep: P,
) -> Result<RelevanceOutcome<CacheRecord>, DomainError>
where
    F: Fn(&CacheRecord) -> String,
    P: Fn(&CacheRecord) -> bool,
{
    let scored = gather_candidates(store, query).await?;

    let mut candidates: Vec<Candidate<CacheRecord>> = scored
        .into_iter()
        .map(|s| Candidate::new(content_key(&s.record), s.distance, s.record))
        .collect();

    if !candidates.is_empty() {
        info!(
            namespaces = ?query.namespaces,
            threshold = query.distance_threshold,
            candidates = candidates.len(),
            distances = %distance_distribution(&candidates),
            "Similarity candidates"
        );
    }

    let gathered = candidates.len();
    candidates.retain(|c| keep(&c.item));
    if candidates.len() < gathered {
        debug!(
            dropped = gathered - candidates.len(),
            "Candidates excluded before ranking"
        );
    }

    let outcome = query.filter().evaluate(candidates);

    match &outcome {
        RelevanceOutcome::Relevant(selected) => {
            debug!(selected = selected.len(), "Candidates passed relevance filter");
        }
        RelevanceOutcome::NoRelevantKnowledge {
            closest: Some(closest),
        } => {
            warn!(
                namespaces = ?query.namespaces,
                closest = closest,
                threshold = query.distance_threshold,
                "No candidate passed the relevance threshold"
            );
        }
        RelevanceOutcome::NoRelevantKnowledge { closest: None } => {
            debug!(namespaces = ?query.namespaces, "No candidates found");
        }
    }

    Ok(outcome)
}
