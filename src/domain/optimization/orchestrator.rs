//! Tiered cache orchestration
//!
//! Probe tiers shallowest first. On a full miss synthesize a pure artifact,
//! then walk back up writing every tier that was missed, hydrating before the
//! first tier that stores hydrated artifacts.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use super::adapter::{Hydrator, Synthesizer};
use super::artifact::Artifact;
use super::request::{CodeContext, OptimizeRequest};
use super::response::{OptimizeResponse, ResolutionMetrics};
use super::single_flight::SingleFlight;
use crate::domain::error::AdapterPhase;
use crate::domain::relevance::RelevanceConfig;
use crate::domain::similarity::{CacheRecord, RecordId, SimilarityStore};
use crate::domain::tier::{
    probe_tier, satisfies_match_fields, ArtifactForm, MatchValues, NamespaceScope,
    TierDefinition,
};
use crate::domain::DomainError;

/// Payload field holding the artifact's language
pub const LANGUAGE_FIELD: &str = "language";

/// The default two-tier layout: per-organization hydrated artifacts over a
/// global pool of pure ones
pub fn standard_tiers(calibration: &RelevanceConfig) -> Vec<TierDefinition> {
    vec![
        TierDefinition::new(
            "tier1",
            NamespaceScope::PerCaller("tier1".to_string()),
            ArtifactForm::Hydrated,
        )
        .with_calibration(calibration.clone())
        .with_match_field(LANGUAGE_FIELD),
        TierDefinition::new(
            "tier2",
            NamespaceScope::Shared("tier2:global".to_string()),
            ArtifactForm::Pure,
        )
        .with_calibration(calibration.clone()),
    ]
}

/// Where the returned artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Hit in the tier at this depth
    Tier(usize),
    Synthesis,
}

/// Resolves optimization requests through an ordered list of tiers
#[derive(Debug)]
pub struct TieredCacheOrchestrator {
    store: Arc<dyn SimilarityStore>,
    tiers: Vec<TierDefinition>,
    hydrator: Arc<dyn Hydrator>,
    synthesizer: Arc<dyn Synthesizer>,
    single_flight: Option<SingleFlight>,
}

impl TieredCacheOrchestrator {
    pub fn new(
        store: Arc<dyn SimilarityStore>,
        tiers: Vec<TierDefinition>,
        hydrator: Arc<dyn Hydrator>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            store,
            tiers,
            hydrator,
            synthesizer,
            single_flight: None,
        }
    }

    /// Coalesce concurrent requests that share a first-tier fingerprint
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled.then(SingleFlight::new);
        self
    }

    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    pub fn store(&self) -> &Arc<dyn SimilarityStore> {
        &self.store
    }

    /// Keys held by resolutions that are still running
    pub fn in_flight(&self) -> usize {
        self.single_flight.as_ref().map_or(0, SingleFlight::active_keys)
    }

    /// Namespace and record id of a request in a tier
    ///
    /// Per-caller tiers fingerprint their namespace too, so identical intents
    /// of different callers never share an id.
    pub fn locate(&self, tier: &TierDefinition, request: &OptimizeRequest) -> (String, RecordId) {
        let namespace = tier.namespace_for(&request.org_id);
        let values = match_values(&request.context);

        let mut parts: Vec<&str> = Vec::new();
        if tier.scope.is_per_caller() {
            parts.push(&namespace);
        }
        parts.push(&request.intent);
        parts.extend(
            tier.match_fields
                .iter()
                .filter_map(|field| values.get(field).map(String::as_str)),
        );

        let id = RecordId::fingerprint(parts);
        (namespace, id)
    }

    /// Resolve a request to an artifact, populating every missed tier
    #[instrument(skip(self, request), fields(org_id = %request.org_id, language = %request.context.language))]
    pub async fn resolve(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, DomainError> {
        request.check()?;
        let started = Instant::now();

        let _flight = match (&self.single_flight, self.tiers.first()) {
            (Some(flight), Some(first)) => {
                let (_, key) = self.locate(first, request);
                Some(flight.acquire(key.as_str()).await)
            }
            _ => None,
        };

        let mut metrics = ResolutionMetrics::default();

        let (origin, mut artifact) = match self.probe(request).await? {
            Some((depth, artifact)) => (Origin::Tier(depth), artifact),
            None => {
                let synthesis_started = Instant::now();
                let produced = self
                    .synthesizer
                    .synthesize(request)
                    .await
                    .map_err(|e| e.in_phase(AdapterPhase::Synthesis))?;
                metrics.synthesis_ms = Some(elapsed_ms(synthesis_started));
                debug!(synthesis_ms = metrics.synthesis_ms, "Synthesized new artifact");

                (Origin::Synthesis, produced.into_artifact())
            }
        };

        let depth = match origin {
            Origin::Tier(depth) => depth,
            Origin::Synthesis => self.tiers.len(),
        };

        let mut hydrated = false;

        for tier in self.tiers[..depth].iter().rev() {
            if tier.form == ArtifactForm::Hydrated && artifact.is_pure() {
                artifact = self.hydrate(&artifact, &request.context, &mut metrics).await?;
                hydrated = true;
            }
            artifact = self.write_through(tier, request, artifact).await?;
        }

        if artifact.is_pure() {
            artifact = self.hydrate(&artifact, &request.context, &mut metrics).await?;
            hydrated = true;
        }

        let source_tier = self.source_label(origin, hydrated);
        metrics.latency_ms = elapsed_ms(started);

        info!(
            source_tier = %source_tier,
            latency_ms = metrics.latency_ms,
            hydration_ms = ?metrics.hydration_ms,
            synthesis_ms = ?metrics.synthesis_ms,
            "Resolved optimization request"
        );

        Ok(OptimizeResponse::success(source_tier, artifact, metrics))
    }

    /// Probe tiers in order; the first hit wins
    async fn probe(
        &self,
        request: &OptimizeRequest,
    ) -> Result<Option<(usize, Artifact)>, DomainError> {
        let values = match_values(&request.context);

        for (depth, tier) in self.tiers.iter().enumerate() {
            let (namespace, id) = self.locate(tier, request);

            // Exact fingerprint first: a repeated request must not lose to a
            // same-intent record of another language
            if let Some(record) = self.store.get(&namespace, &id).await? {
                if satisfies_match_fields(&record, &tier.match_fields, &values) {
                    debug!(tier = %tier.name, id = %id, "Serving exact match from tier");
                    return Ok(Some((depth, record.payload_as()?)));
                }
            }

            let outcome = probe_tier(
                self.store.as_ref(),
                tier,
                &namespace,
                &request.intent,
                &values,
            )
            .await?;

            if let Some(best) = outcome.into_best() {
                let artifact: Artifact = best.item.payload_as()?;
                debug!(tier = %tier.name, distance = best.distance, "Serving from tier");
                return Ok(Some((depth, artifact)));
            }
        }

        debug!(tiers = self.tiers.len(), "All tiers missed");
        Ok(None)
    }

    async fn hydrate(
        &self,
        artifact: &Artifact,
        context: &CodeContext,
        metrics: &mut ResolutionMetrics,
    ) -> Result<Artifact, DomainError> {
        let started = Instant::now();
        let code = self
            .hydrator
            .hydrate(artifact, context)
            .await
            .map_err(|e| e.in_phase(AdapterPhase::Hydration))?;
        metrics.add_hydration(elapsed_ms(started));

        Ok(artifact.hydrated(code, context.language.clone()))
    }

    /// Insert if absent, then return whatever the tier holds for this id
    async fn write_through(
        &self,
        tier: &TierDefinition,
        request: &OptimizeRequest,
        artifact: Artifact,
    ) -> Result<Artifact, DomainError> {
        let (namespace, id) = self.locate(tier, request);
        let record = CacheRecord::from_payload(&namespace, id.clone(), &request.intent, &artifact)?;

        let outcome = self.store.insert(record).await?;
        debug!(
            tier = %tier.name,
            namespace = %namespace,
            id = %id,
            outcome = ?outcome,
            "Tier write"
        );

        match self.store.get(&namespace, &id).await? {
            Some(stored) => stored.payload_as(),
            None => Ok(artifact),
        }
    }

    fn source_label(&self, origin: Origin, hydrated: bool) -> String {
        match origin {
            Origin::Tier(depth) => {
                let name = &self.tiers[depth].name;
                if hydrated {
                    format!("{}+hydration", name)
                } else {
                    name.clone()
                }
            }
            Origin::Synthesis => format!("tier{}+synthesis", self.tiers.len() + 1),
        }
    }
}

fn match_values(context: &CodeContext) -> MatchValues {
    MatchValues::from([(LANGUAGE_FIELD.to_string(), context.language.clone())])
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::optimization::adapter::{MockHydrator, MockSynthesizer};
    use crate::domain::optimization::SynthesizedArtifact;
    use crate::domain::similarity::MockSimilarityStore;

    fn request(language: &str) -> OptimizeRequest {
        OptimizeRequest::new(
            "acme",
            "find shortest path in weighted graph",
            CodeContext::new(language).with_variable("graph"),
        )
    }

    fn orchestrator(
        store: Arc<MockSimilarityStore>,
        hydrator: impl Hydrator + 'static,
        synthesizer: impl Synthesizer + 'static,
    ) -> TieredCacheOrchestrator {
        TieredCacheOrchestrator::new(
            store,
            standard_tiers(&RelevanceConfig::cache_lookup()),
            Arc::new(hydrator),
            Arc::new(synthesizer),
        )
    }

    /// Yields before answering and never returns the same output twice
    #[derive(Debug, Default)]
    struct DriftingSynthesizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Synthesizer for DriftingSynthesizer {
        async fn synthesize(
            &self,
            _request: &OptimizeRequest,
        ) -> Result<SynthesizedArtifact, DomainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(SynthesizedArtifact::new(format!("dijkstra_v{}();", n), "O(E log V)"))
        }
    }

    #[derive(Debug, Default)]
    struct DriftingHydrator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Hydrator for DriftingHydrator {
        async fn hydrate(
            &self,
            artifact: &Artifact,
            context: &CodeContext,
        ) -> Result<String, DomainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(format!("// {} #{}\n{}", context.language, n, artifact.optimized_code))
        }
    }

    #[tokio::test]
    async fn test_double_miss_synthesizes_once_then_serves_tier1() {
        let store = Arc::new(MockSimilarityStore::new());

        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(SynthesizedArtifact::new("dijkstra();", "O(E log V)")));

        let mut hydrator = MockHydrator::new();
        hydrator
            .expect_hydrate()
            .times(1)
            .returning(|a, c| Ok(format!("{} in {}", a.optimized_code, c.language)));

        let engine = orchestrator(store.clone(), hydrator, synthesizer);

        let first = engine.resolve(&request("Go")).await.unwrap();
        assert_eq!(first.source_tier, "tier3+synthesis");
        assert_eq!(first.optimized_code, "dijkstra(); in Go");
        assert_eq!(first.language, "Go");
        assert_eq!(first.time_complexity, "O(E log V)");
        assert!(first.metrics.synthesis_ms.is_some());
        assert!(first.metrics.hydration_ms.is_some());

        assert_eq!(store.count("tier2:global").await.unwrap(), 1);
        assert_eq!(store.count("tier1:acme").await.unwrap(), 1);

        // Mock expectations fail the test on any further adapter call
        let second = engine.resolve(&request("Go")).await.unwrap();
        assert_eq!(second.source_tier, "tier1");
        assert_eq!(second.optimized_code, first.optimized_code);
        assert!(second.metrics.synthesis_ms.is_none());
        assert!(second.metrics.hydration_ms.is_none());
    }

    #[tokio::test]
    async fn test_tier2_hit_hydrates_and_writes_tier1() {
        let store = Arc::new(MockSimilarityStore::new());

        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(SynthesizedArtifact::new("dijkstra();", "O(E log V)")));

        let mut hydrator = MockHydrator::new();
        hydrator
            .expect_hydrate()
            .times(2)
            .returning(|a, c| Ok(format!("{} in {}", a.optimized_code, c.language)));

        let engine = orchestrator(store.clone(), hydrator, synthesizer);

        engine.resolve(&request("Go")).await.unwrap();
        let rust = engine.resolve(&request("Rust")).await.unwrap();

        assert_eq!(rust.source_tier, "tier2+hydration");
        assert_eq!(rust.optimized_code, "dijkstra(); in Rust");
        assert_eq!(store.count("tier1:acme").await.unwrap(), 2);
        assert_eq!(store.count("tier2:global").await.unwrap(), 1);

        // Both languages now repeat from tier 1 without adapter calls
        assert_eq!(engine.resolve(&request("Rust")).await.unwrap().source_tier, "tier1");
        assert_eq!(engine.resolve(&request("Go")).await.unwrap().source_tier, "tier1");
    }

    #[tokio::test]
    async fn test_wrong_language_at_close_distance_falls_through() {
        let (namespace, id) = {
            let probe = orchestrator(
                Arc::new(MockSimilarityStore::new()),
                MockHydrator::new(),
                MockSynthesizer::new(),
            );
            let tier1 = probe.tiers()[0].clone();
            probe.locate(&tier1, &request("Go"))
        };
        let go_artifact = Artifact::pure("x", "O(1)").hydrated("go code", "Go");
        let pure = Artifact::pure("pure code", "O(1)");

        let store = Arc::new(
            MockSimilarityStore::new()
                .with_candidate(
                    CacheRecord::from_payload(&namespace, id, "find shortest path", &go_artifact)
                        .unwrap(),
                    0.1,
                )
                .with_candidate(
                    CacheRecord::from_payload(
                        "tier2:global",
                        RecordId::fingerprint(["find shortest path"]),
                        "find shortest path",
                        &pure,
                    )
                    .unwrap(),
                    0.2,
                ),
        );

        let mut hydrator = MockHydrator::new();
        hydrator
            .expect_hydrate()
            .times(1)
            .returning(|_, _| Ok("python code".to_string()));

        let engine = orchestrator(store, hydrator, MockSynthesizer::new());

        let response = engine.resolve(&request("Python")).await.unwrap();

        assert_eq!(response.source_tier, "tier2+hydration");
        assert_eq!(response.optimized_code, "python code");
        assert_eq!(response.language, "Python");
    }

    #[tokio::test]
    async fn test_synthesis_failure_writes_nothing() {
        let store = Arc::new(MockSimilarityStore::new());

        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .returning(|_| Err(DomainError::provider("openai", "rate limited")));

        let engine = orchestrator(store.clone(), MockHydrator::new(), synthesizer);

        let err = engine.resolve(&request("Go")).await.unwrap_err();

        assert_eq!(err.phase(), Some(AdapterPhase::Synthesis));
        assert!(store.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hydration_failure_keeps_pure_tier_only() {
        let store = Arc::new(MockSimilarityStore::new());

        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .returning(|_| Ok(SynthesizedArtifact::new("dijkstra();", "O(E log V)")));

        let mut hydrator = MockHydrator::new();
        hydrator
            .expect_hydrate()
            .returning(|_, _| Err(DomainError::adapter(AdapterPhase::Hydration, "bad json")));

        let engine = orchestrator(store.clone(), hydrator, synthesizer);

        let err = engine.resolve(&request("Go")).await.unwrap_err();

        assert_eq!(err.phase(), Some(AdapterPhase::Hydration));
        assert_eq!(store.count("tier2:global").await.unwrap(), 1);
        assert_eq!(store.count("tier1:acme").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_unavailable_is_fatal() {
        let store = Arc::new(MockSimilarityStore::new().unavailable());

        let engine = orchestrator(store, MockHydrator::new(), MockSynthesizer::new());

        let err = engine.resolve(&request("Go")).await.unwrap_err();

        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_store() {
        let store = Arc::new(MockSimilarityStore::new());
        let engine = orchestrator(store.clone(), MockHydrator::new(), MockSynthesizer::new());

        let err = engine.resolve(&request(" ")).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_identical_misses_return_identical_artifacts() {
        let store = Arc::new(MockSimilarityStore::new());
        let synthesizer = Arc::new(DriftingSynthesizer::default());
        let engine = TieredCacheOrchestrator::new(
            store.clone(),
            standard_tiers(&RelevanceConfig::cache_lookup()),
            Arc::new(DriftingHydrator::default()),
            synthesizer.clone(),
        );

        let req = request("Go");
        let (a, b) = tokio::join!(engine.resolve(&req), engine.resolve(&req));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.optimized_code, b.optimized_code);
        assert_eq!(a.time_complexity, b.time_complexity);
        assert_eq!(store.count("tier1:acme").await.unwrap(), 1);
        assert_eq!(store.count("tier2:global").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_single_flight_coalesces_concurrent_misses() {
        let store = Arc::new(MockSimilarityStore::new());
        let synthesizer = Arc::new(DriftingSynthesizer::default());
        let engine = TieredCacheOrchestrator::new(
            store.clone(),
            standard_tiers(&RelevanceConfig::cache_lookup()),
            Arc::new(DriftingHydrator::default()),
            synthesizer.clone(),
        )
        .with_single_flight(true);

        let req = request("Go");
        let (a, b) = tokio::join!(engine.resolve(&req), engine.resolve(&req));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.optimized_code, b.optimized_code);
        let mut sources = vec![a.source_tier, b.source_tier];
        sources.sort();
        assert_eq!(sources, vec!["tier1", "tier3+synthesis"]);
    }

    #[derive(Debug)]
    struct StalledHydrator;

    #[async_trait]
    impl Hydrator for StalledHydrator {
        async fn hydrate(
            &self,
            _artifact: &Artifact,
            _context: &CodeContext,
        ) -> Result<String, DomainError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_resolve_leaves_no_partial_tier() {
        let store = Arc::new(MockSimilarityStore::new());
        let mut synthesizer = MockSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(SynthesizedArtifact::new("dijkstra();", "O(E log V)")));
        let engine = orchestrator(store.clone(), StalledHydrator, synthesizer)
            .with_single_flight(true);

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            engine.resolve(&request("Go")),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(store.count("tier2:global").await.unwrap(), 1);
        assert_eq!(store.count("tier1:acme").await.unwrap(), 0);
        assert_eq!(engine.in_flight(), 0);

        let (namespace, id) = engine.locate(&engine.tiers()[1], &request("Go"));
        let record = store.get(&namespace, &id).await.unwrap().unwrap();
        assert_eq!(record.payload_str("optimized_code"), Some("dijkstra();"));
    }

    #[test]
    fn test_locate_scopes_ids() {
        let engine = orchestrator(
            Arc::new(MockSimilarityStore::new()),
            MockHydrator::new(),
            MockSynthesizer::new(),
        );
        let tier1 = engine.tiers()[0].clone();
        let tier2 = engine.tiers()[1].clone();

        let (ns_go, id_go) = engine.locate(&tier1, &request("Go"));
        let (_, id_rust) = engine.locate(&tier1, &request("Rust"));
        let (ns2, id2_go) = engine.locate(&tier2, &request("Go"));
        let (_, id2_rust) = engine.locate(&tier2, &request("Rust"));

        assert_eq!(ns_go, "tier1:acme");
        assert_eq!(ns2, "tier2:global");
        assert_ne!(id_go, id_rust);
        assert_eq!(id2_go, id2_rust);
        assert_eq!(
            id2_go,
            RecordId::fingerprint(["find shortest path in weighted graph"])
        );
    }
}
