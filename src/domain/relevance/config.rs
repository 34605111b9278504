//! Distance calibration shared by cache lookup and rule retrieval

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Threshold and pool sizes for one similarity call site
///
/// Distances are cosine distances: 0 = identical, 2 = opposite.
/// Rough calibration guide:
/// - below 0.30: near-duplicate
/// - 0.30 to 0.70: semantically related
/// - 0.70 to 1.20: loosely related
/// - above 1.20: likely irrelevant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Candidates at or above this distance are dropped
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,

    /// Candidates requested from each namespace before filtering
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,

    /// Maximum results kept after filtering
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_distance_threshold() -> f32 {
    1.0
}

fn default_candidate_pool_size() -> usize {
    8
}

fn default_max_results() -> usize {
    5
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self::retrieval()
    }
}

impl RelevanceConfig {
    /// Calibration for multi-match rule retrieval
    pub fn retrieval() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            candidate_pool_size: default_candidate_pool_size(),
            max_results: default_max_results(),
        }
    }

    /// Calibration for single-best-match artifact lookup
    pub fn cache_lookup() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            candidate_pool_size: 1,
            max_results: 1,
        }
    }

    pub fn with_distance_threshold(mut self, threshold: f32) -> Self {
        self.distance_threshold = threshold;
        self
    }

    pub fn with_candidate_pool_size(mut self, size: usize) -> Self {
        self.candidate_pool_size = size;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Reject calibrations that could never produce a result
    pub fn validate(&self, section: &str) -> Result<(), DomainError> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(DomainError::configuration(format!(
                "{}.distance_threshold must be a positive number, got {}",
                section, self.distance_threshold
            )));
        }

        if self.candidate_pool_size == 0 {
            return Err(DomainError::configuration(format!(
                "{}.candidate_pool_size must be at least 1",
                section
            )));
        }

        if self.max_results == 0 {
            return Err(DomainError::configuration(format!(
                "{}.max_results must be at least 1",
                section
            )));
        }

        Ok(())
    }
}
