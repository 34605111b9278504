//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::DomainError;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Record count per namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<NamespaceCount>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NamespaceCount {
    pub namespace: String,
    pub records: usize,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check: the similarity store must answer
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let store_check = check_store(&state).await;
    let overall_status = store_check.status;

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![store_check]),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - used to detect crashes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_store(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let name = format!("similarity_store:{}", state.store.store_name());

    match namespace_counts(state).await {
        Ok(namespaces) => {
            let records: usize = namespaces.iter().map(|n| n.records).sum();
            HealthCheck {
                name,
                status: HealthStatus::Healthy,
                message: Some(format!(
                    "{} records in {} namespaces",
                    records,
                    namespaces.len()
                )),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                namespaces: Some(namespaces),
            }
        }
        Err(e) => HealthCheck {
            name,
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            namespaces: None,
        },
    }
}

async fn namespace_counts(state: &AppState) -> Result<Vec<NamespaceCount>, DomainError> {
    let mut counts = Vec::new();

    for namespace in state.store.namespaces().await? {
        let records = state.store.count(&namespace).await?;
        counts.push(NamespaceCount { namespace, records });
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::mock::test_state;
    use crate::domain::guidance::IngestRuleRequest;
    use crate::domain::similarity::MockSimilarityStore;

    async fn get_ready(state: AppState) -> (StatusCode, serde_json::Value) {
        let app = Router::new()
            .route("/ready", get(ready_check))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(!json.contains("checks"));
    }

    #[tokio::test]
    async fn test_ready_reports_record_counts() {
        let state = test_state();
        state
            .guidance
            .ingest(IngestRuleRequest::new("Backend", "Auth", "Use RS256 for JWT"))
            .await
            .unwrap();

        let (status, body) = get_ready(state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        let check = &body["checks"][0];
        assert_eq!(check["name"], "similarity_store:in_memory");
        assert_eq!(check["namespaces"][0]["namespace"], "guidelines:backend");
        assert_eq!(check["namespaces"][0]["records"], 1);
    }

    #[tokio::test]
    async fn test_ready_unavailable_store() {
        let mut state = test_state();
        state.store = Arc::new(MockSimilarityStore::new().unavailable());

        let (status, body) = get_ready(state).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert!(body["checks"][0]["message"]
            .as_str()
            .unwrap()
            .contains("mock store is down"));
    }
}
