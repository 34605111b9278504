//! Relevance filter: threshold, rank, deduplicate, cap

use std::collections::HashSet;

use serde::Serialize;

use super::config::RelevanceConfig;

/// A distance-annotated candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate<T> {
    /// Normalized semantic content used for deduplication
    pub content_key: String,
    pub distance: f32,
    pub item: T,
}

impl<T> Candidate<T> {
    pub fn new(content_key: impl Into<String>, distance: f32, item: T) -> Self {
        Self {
            content_key: content_key.into(),
            distance,
            item,
        }
    }
}

/// Outcome of filtering: either confident knowledge or an explicit absence of it
#[derive(Debug, Clone, PartialEq)]
pub enum RelevanceOutcome<T> {
    /// At least one candidate passed, most relevant first
    Relevant(Vec<Candidate<T>>),
    /// Nothing passed the threshold
    NoRelevantKnowledge {
        /// Distance of the closest rejected candidate, if there was any
        closest: Option<f32>,
    },
}

impl<T> RelevanceOutcome<T> {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant(_))
    }

    /// Consume into the ranked list, empty when nothing qualified
    pub fn into_candidates(self) -> Vec<Candidate<T>> {
        match self {
            Self::Relevant(candidates) => candidates,
            Self::NoRelevantKnowledge { .. } => Vec::new(),
        }
    }
}

/// Pure filter over a candidate list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFilter {
    distance_threshold: f32,
    max_results: usize,
}

impl RelevanceFilter {
    pub fn new(distance_threshold: f32, max_results: usize) -> Self {
        Self {
            distance_threshold,
            max_results,
        }
    }

    pub fn from_config(config: &RelevanceConfig) -> Self {
        Self::new(config.distance_threshold, config.max_results)
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Whether a single distance qualifies (strictly below the threshold)
    pub fn accepts(&self, distance: f32) -> bool {
        distance < self.distance_threshold
    }

    /// Filter, rank, deduplicate and truncate
    pub fn apply<T>(&self, candidates: Vec<Candidate<T>>) -> Vec<Candidate<T>> {
        let mut survivors: Vec<Candidate<T>> = candidates
            .into_iter()
            .filter(|c| self.accepts(c.distance))
            .collect();

        if survivors.is_empty() {
            return survivors;
        }

        // Vec::sort_by is stable: equal distances keep their input order
        survivors.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut seen = HashSet::new();
        survivors.retain(|c| seen.insert(c.content_key.clone()));
        survivors.truncate(self.max_results);

        survivors
    }

    /// Like [`apply`](Self::apply), but reports an empty result as an explicit outcome
    pub fn evaluate<T>(&self, candidates: Vec<Candidate<T>>) -> RelevanceOutcome<T> {
        let closest = closest_distance(&candidates);
        let selected = self.apply(candidates);

        if selected.is_empty() {
            RelevanceOutcome::NoRelevantKnowledge { closest }
        } else {
            RelevanceOutcome::Relevant(selected)
        }
    }
}

/// Smallest finite distance in the list
pub fn closest_distance<T>(candidates: &[Candidate<T>]) -> Option<f32> {
    candidates
        .iter()
        .map(|c| c.distance)
        .filter(|d| d.is_finite())
        .min_by(|a, b| a.total_cmp(b))
}

/// Render every candidate distance, closest first, for threshold calibration logs
pub fn distance_distribution<T>(candidates: &[Candidate<T>]) -> String {
    let mut entries: Vec<(&str, f32)> = candidates
        .iter()
        .map(|c| (c.content_key.as_str(), c.distance))
        .collect();
    entries.sort_by(|a, b| a.1.total_cmp(&b.1));

    entries
        .iter()
        .map(|(key, distance)| format!("{}={:.3}", truncate_key(key, 20), distance))
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate_key(key: &str, max_chars: usize) -> &str {
    match key.char_indices().nth(max_chars) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
