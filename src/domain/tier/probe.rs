//! Probing a single tier

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::definition::{AcceptancePolicy, TierDefinition};
use crate::domain::relevance::{
    closest_distance, distance_distribution, query_namespace, Candidate, RelevanceFilter,
};
use crate::domain::similarity::{normalize_key, CacheRecord, SimilarityStore};
use crate::domain::DomainError;

/// Request values checked against a tier's match fields
pub type MatchValues = BTreeMap<String, String>;

/// Result of probing one tier
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Accepted records, closest first
    Hit(Vec<Candidate<CacheRecord>>),
    Miss {
        /// Closest candidate seen, whether or not it qualified
        closest: Option<f32>,
    },
}

impl ProbeOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Best accepted record, if any
    pub fn best(&self) -> Option<&Candidate<CacheRecord>> {
        match self {
            Self::Hit(candidates) => candidates.first(),
            Self::Miss { .. } => None,
        }
    }

    pub fn into_best(self) -> Option<Candidate<CacheRecord>> {
        match self {
            Self::Hit(candidates) => candidates.into_iter().next(),
            Self::Miss { .. } => None,
        }
    }
}

/// Check that every match field of the record equals the request's value
pub fn satisfies_match_fields(
    record: &CacheRecord,
    match_fields: &[String],
    values: &MatchValues,
) -> bool {
    match_fields.iter().all(|field| {
        let stored = record.payload_str(field).map(normalize_key);
        let wanted = values.get(field).map(|v| normalize_key(v));
        stored.is_some() && stored == wanted
    })
}

/// Query a tier's namespace and apply its acceptance policy
pub async fn probe_tier(
    store: &dyn SimilarityStore,
    tier: &TierDefinition,
    namespace: &str,
    query_text: &str,
    values: &MatchValues,
) -> Result<ProbeOutcome, DomainError> {
    let scored = query_namespace(
        store,
        namespace,
        query_text,
        tier.calibration.candidate_pool_size,
    )
    .await?;

    let candidates: Vec<Candidate<CacheRecord>> = scored
        .into_iter()
        .map(|s| Candidate::new(s.record.id().to_string(), s.distance, s.record))
        .collect();

    if !candidates.is_empty() {
        info!(
            tier = %tier.name,
            namespace = %namespace,
            threshold = tier.calibration.distance_threshold,
            distances = %distance_distribution(&candidates),
            "Tier candidates"
        );
    }

    let filter = RelevanceFilter::from_config(&tier.calibration);
    let closest = closest_distance(&candidates);

    let mut accepted = filter.apply(candidates);

    if accepted.is_empty() {
        debug!(tier = %tier.name, closest = ?closest, "Tier miss: nothing under threshold");
        return Ok(ProbeOutcome::Miss { closest });
    }

    match tier.policy {
        AcceptancePolicy::SingleBestMatch => {
            accepted.truncate(1);
            let best = &accepted[0];
            if !satisfies_match_fields(&best.item, &tier.match_fields, values) {
                debug!(
                    tier = %tier.name,
                    distance = best.distance,
                    fields = ?tier.match_fields,
                    "Tier miss: closest candidate fails equality constraint"
                );
                return Ok(ProbeOutcome::Miss { closest });
            }
        }
        AcceptancePolicy::MultiMatch => {
            accepted.retain(|c| satisfies_match_fields(&c.item, &tier.match_fields, values));
            if accepted.is_empty() {
                debug!(tier = %tier.name, "Tier miss: no candidate satisfies equality constraints");
                return Ok(ProbeOutcome::Miss { closest });
            }
        }
    }

    debug!(
        tier = %tier.name,
        distance = accepted[0].distance,
        "Tier hit"
    );
    Ok(ProbeOutcome::Hit(accepted))
}
