//! Multi-match rule retrieval

use std::sync::Arc;

use tracing::{debug, info};

use super::rule::{
    namespace_domain, project_matches, rule_namespace, IngestOutcome, IngestRuleRequest,
    RetrievedRule, Rule, ALL_PROJECTS,
};
use crate::domain::relevance::{
    search_where, Candidate, RelevanceConfig, RelevanceOutcome, RelevanceQuery,
};
use crate::domain::similarity::{normalize_key, CacheRecord, SimilarityStore};
use crate::domain::DomainError;

/// Domain whose rules apply to every request
pub const DEFAULT_GLOBAL_DOMAIN: &str = "Global";

/// Stores rules and finds the ones relevant to a prompt
#[derive(Debug, Clone)]
pub struct RuleRetriever {
    store: Arc<dyn SimilarityStore>,
    calibration: RelevanceConfig,
    global_domain: String,
}

impl RuleRetriever {
    pub fn new(store: Arc<dyn SimilarityStore>, calibration: RelevanceConfig) -> Self {
        Self {
            store,
            calibration,
            global_domain: DEFAULT_GLOBAL_DOMAIN.to_string(),
        }
    }

    pub fn with_global_domain(mut self, domain: impl Into<String>) -> Self {
        self.global_domain = domain.into();
        self
    }

    pub fn global_domain(&self) -> &str {
        &self.global_domain
    }

    fn is_global(&self, domain: &str) -> bool {
        normalize_key(domain) == normalize_key(&self.global_domain)
    }

    /// Namespaces searched for a domain: global first, then the domain itself
    pub fn namespaces_for(&self, domain: &str) -> Vec<String> {
        let mut namespaces = vec![rule_namespace(&self.global_domain)];
        if !domain.trim().is_empty() && !self.is_global(domain) {
            namespaces.push(rule_namespace(domain));
        }
        namespaces
    }

    /// Add a rule unless it is already present
    pub async fn ingest(&self, request: IngestRuleRequest) -> Result<IngestOutcome, DomainError> {
        let rule = request.into_rule()?;
        let id = rule.record_id();
        let namespace = rule.namespace();

        if self.store.exists(&namespace, &id).await? {
            info!(id = %id, namespace = %namespace, "Rule already exists, skipping ingestion");
            return Ok(IngestOutcome {
                id,
                namespace,
                created: false,
            });
        }

        let record = CacheRecord::from_payload(&namespace, id.clone(), rule.document_text(), &rule)?;
        let created = self.store.insert(record).await?.is_inserted();

        info!(
            domain = %rule.domain,
            project = %rule.project,
            topic = %rule.topic,
            id = %id,
            created = created,
            "Ingested rule"
        );

        Ok(IngestOutcome {
            id,
            namespace,
            created,
        })
    }

    /// Rules relevant to a prompt, most relevant first
    pub async fn retrieve(
        &self,
        prompt: &str,
        domain: &str,
    ) -> Result<RelevanceOutcome<Rule>, DomainError> {
        self.retrieve_in_project(prompt, domain, None).await
    }

    /// Like [`retrieve`](Self::retrieve), restricted to rules that apply to `project`
    ///
    /// Rules of other projects are dropped before the result cap, so they never
    /// crowd out a qualifying rule.
    pub async fn retrieve_in_project(
        &self,
        prompt: &str,
        domain: &str,
        project: Option<&str>,
    ) -> Result<RelevanceOutcome<Rule>, DomainError> {
        let query = RelevanceQuery::new(prompt, self.namespaces_for(domain), &self.calibration);

        let content_key = |record: &CacheRecord| {
            record
                .payload_str("rule_text")
                .map(normalize_key)
                .unwrap_or_else(|| record.id().to_string())
        };
        let in_project = |record: &CacheRecord| match project {
            Some(project) => project_matches(
                record.payload_str("project").unwrap_or(ALL_PROJECTS),
                project,
            ),
            None => true,
        };

        let outcome = search_where(self.store.as_ref(), &query, content_key, in_project).await?;

        let outcome = match outcome {
            RelevanceOutcome::Relevant(candidates) => {
                let mut rules = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    let rule: Rule = candidate.item.payload_as()?;
                    rules.push(Candidate::new(
                        candidate.content_key,
                        candidate.distance,
                        rule,
                    ));
                }
                info!(
                    domain = %domain,
                    selected = rules.len(),
                    distances = ?rules.iter().map(|c| c.distance).collect::<Vec<_>>(),
                    "Retrieved rules"
                );
                RelevanceOutcome::Relevant(rules)
            }
            RelevanceOutcome::NoRelevantKnowledge { closest } => {
                debug!(domain = %domain, "No rules retrieved");
                RelevanceOutcome::NoRelevantKnowledge { closest }
            }
        };

        Ok(outcome)
    }

    /// Convenience form of [`retrieve`](Self::retrieve) that flattens to a list
    pub async fn retrieve_rules(
        &self,
        prompt: &str,
        domain: &str,
    ) -> Result<Vec<RetrievedRule>, DomainError> {
        self.retrieve_rules_in_project(prompt, domain, None).await
    }

    pub async fn retrieve_rules_in_project(
        &self,
        prompt: &str,
        domain: &str,
        project: Option<&str>,
    ) -> Result<Vec<RetrievedRule>, DomainError> {
        Ok(self
            .retrieve_in_project(prompt, domain, project)
            .await?
            .into_candidates()
            .into_iter()
            .map(|c| RetrievedRule {
                rule: c.item,
                distance: c.distance,
            })
            .collect())
    }

    /// All rules, optionally restricted to one domain
    pub async fn list(&self, domain: Option<&str>) -> Result<Vec<Rule>, DomainError> {
        let namespaces = match domain {
            Some(domain) => vec![rule_namespace(domain)],
            None => self
                .store
                .namespaces()
                .await?
                .into_iter()
                .filter(|ns| namespace_domain(ns).is_some())
                .collect(),
        };

        let mut rules = Vec::new();
        for namespace in namespaces {
            for record in self.store.list(&namespace).await? {
                rules.push(record.payload_as::<Rule>()?);
            }
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::similarity::MockSimilarityStore;

    fn rule_record(domain: &str, topic: &str, text: &str) -> CacheRecord {
        let rule = IngestRuleRequest::new(domain, topic, text).into_rule().unwrap();
        CacheRecord::from_payload(rule.namespace(), rule.record_id(), rule.document_text(), &rule)
            .unwrap()
    }

    #[test]
    fn test_namespaces_for_domain() {
        let retriever = RuleRetriever::new(
            Arc::new(MockSimilarityStore::new()),
            RelevanceConfig::retrieval(),
        );

        assert_eq!(
            retriever.namespaces_for("Backend"),
            vec!["guidelines:global", "guidelines:backend"]
        );
        assert_eq!(retriever.namespaces_for("GLOBAL"), vec!["guidelines:global"]);
        assert_eq!(retriever.namespaces_for(""), vec!["guidelines:global"]);
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let store = Arc::new(MockSimilarityStore::new());
        let retriever = RuleRetriever::new(store.clone(), RelevanceConfig::retrieval());

        let first = retriever
            .ingest(IngestRuleRequest::new("Backend", "Auth", "Use RS256 for JWT"))
            .await
            .unwrap();
        let second = retriever
            .ingest(IngestRuleRequest::new("backend", "Auth", "use rs256 for jwt"))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.count("guidelines:backend").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_merges_global_and_domain() {
        let store = Arc::new(
            MockSimilarityStore::new()
                .with_candidate(rule_record("Global", "Logging", "Use structured logs"), 0.5)
                .with_candidate(rule_record("Backend", "Auth", "Use RS256 for JWT"), 0.3)
                .with_candidate(rule_record("Backend", "Style", "Prefer tabs"), 1.4)
                .with_candidate(rule_record("Frontend", "Auth", "Store tokens in memory"), 0.1),
        );
        let retriever = RuleRetriever::new(store, RelevanceConfig::retrieval());

        let rules = retriever
            .retrieve_rules("write a JWT login handler", "Backend")
            .await
            .unwrap();

        let texts: Vec<&str> = rules.iter().map(|r| r.rule.rule_text.as_str()).collect();
        assert_eq!(texts, vec!["Use RS256 for JWT", "Use structured logs"]);
        assert_eq!(rules[0].distance, 0.3);
    }

    #[tokio::test]
    async fn test_retrieve_caps_results() {
        let mut store = MockSimilarityStore::new();
        for i in 0..20 {
            store = store.with_candidate(
                rule_record("Backend", "Topic", &format!("Rule number {}", i)),
                0.05 * i as f32,
            );
        }
        let retriever = RuleRetriever::new(Arc::new(store), RelevanceConfig::retrieval());

        let rules = retriever.retrieve_rules("anything", "Backend").await.unwrap();

        assert_eq!(rules.len(), 5);
        let distances: Vec<f32> = rules.iter().map(|r| r.distance).collect();
        let mut sorted = distances.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(distances, sorted);
    }

    #[tokio::test]
    async fn test_project_rules_survive_closer_foreign_rules() {
        let mut store = MockSimilarityStore::new();
        for i in 0..5 {
            let rule = IngestRuleRequest::new("Backend", "Payments", format!("Payments rule {}", i))
                .with_project("Payments")
                .into_rule()
                .unwrap();
            store = store.with_candidate(
                CacheRecord::from_payload(rule.namespace(), rule.record_id(), rule.document_text(), &rule)
                    .unwrap(),
                0.1 + 0.05 * i as f32,
            );
        }
        let billing = IngestRuleRequest::new("Backend", "Billing", "Round invoices half-up")
            .with_project("Billing")
            .into_rule()
            .unwrap();
        let store = store.with_candidate(
            CacheRecord::from_payload(
                billing.namespace(),
                billing.record_id(),
                billing.document_text(),
                &billing,
            )
            .unwrap(),
            0.6,
        );
        let retriever = RuleRetriever::new(Arc::new(store), RelevanceConfig::retrieval());

        let unscoped = retriever.retrieve_rules("write billing code", "Backend").await.unwrap();
        let scoped = retriever
            .retrieve_rules_in_project("write billing code", "Backend", Some("Billing"))
            .await
            .unwrap();

        assert_eq!(unscoped.len(), 5);
        assert!(unscoped.iter().all(|r| r.rule.project == "Payments"));
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].rule.rule_text, "Round invoices half-up");
        assert_eq!(scoped[0].distance, 0.6);
    }

    #[tokio::test]
    async fn test_retrieve_nothing_relevant() {
        let store = Arc::new(
            MockSimilarityStore::new()
                .with_candidate(rule_record("Global", "Logging", "Use structured logs"), 1.2),
        );
        let retriever = RuleRetriever::new(store, RelevanceConfig::retrieval());

        let outcome = retriever.retrieve("paint a picture", "Backend").await.unwrap();

        assert_eq!(
            outcome,
            RelevanceOutcome::NoRelevantKnowledge { closest: Some(1.2) }
        );
    }

    #[tokio::test]
    async fn test_list_rules() {
        let store = Arc::new(MockSimilarityStore::new());
        let retriever = RuleRetriever::new(store, RelevanceConfig::retrieval());
        retriever
            .ingest(IngestRuleRequest::new("Backend", "Auth", "Use RS256"))
            .await
            .unwrap();
        retriever
            .ingest(IngestRuleRequest::new("Global", "Logging", "Use structured logs"))
            .await
            .unwrap();

        assert_eq!(retriever.list(None).await.unwrap().len(), 2);
        let backend = retriever.list(Some("BACKEND")).await.unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend[0].rule_text, "Use RS256");
    }
}
