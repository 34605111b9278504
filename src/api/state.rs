//! Application state for shared services

use std::sync::Arc;

use crate::domain::optimization::TieredCacheOrchestrator;
use crate::domain::similarity::SimilarityStore;
use crate::infrastructure::services::GuidanceService;

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<TieredCacheOrchestrator>,
    pub guidance: Arc<GuidanceService>,
    pub store: Arc<dyn SimilarityStore>,
    /// Key required to ingest rules; ingestion is disabled when unset
    pub ingest_api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<TieredCacheOrchestrator>,
        guidance: Arc<GuidanceService>,
        store: Arc<dyn SimilarityStore>,
    ) -> Self {
        Self {
            orchestrator,
            guidance,
            store,
            ingest_api_key: None,
        }
    }

    pub fn with_ingest_api_key(mut self, key: Option<String>) -> Self {
        self.ingest_api_key = key.map(Arc::from);
        self
    }
}
