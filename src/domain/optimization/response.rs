//! Optimization response

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;

/// Timings of one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionMetrics {
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_ms: Option<u64>,
}

impl ResolutionMetrics {
    pub(crate) fn add_hydration(&mut self, ms: u64) {
        self.hydration_ms = Some(self.hydration_ms.unwrap_or(0) + ms);
    }
}

/// Result of resolving an optimization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub status: String,
    /// Where the artifact came from, e.g. `tier1`, `tier2+hydration`, `tier3+synthesis`
    pub source_tier: String,
    pub language: String,
    pub time_complexity: String,
    pub optimized_code: String,
    pub metrics: ResolutionMetrics,
}

impl OptimizeResponse {
    pub fn success(
        source_tier: impl Into<String>,
        artifact: Artifact,
        metrics: ResolutionMetrics,
    ) -> Self {
        Self {
            status: "success".to_string(),
            source_tier: source_tier.into(),
            language: artifact.language,
            time_complexity: artifact.time_complexity,
            optimized_code: artifact.optimized_code,
            metrics,
        }
    }
}
