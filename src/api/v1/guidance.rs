//! Guidance endpoints: prompt enhancement and rule management

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use tracing::{debug, info};

use crate::api::middleware::RequireIngestKey;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, EnhancePromptBody, EnhancePromptResponse, IngestRuleResponse, Json,
    RetrieveRulesBody, RetrieveRulesResponse, RulesListResponse, RulesQuery,
};
use crate::domain::guidance::IngestRuleRequest;

/// POST /v1/guidance/enhance
pub async fn enhance_prompt(
    State(state): State<AppState>,
    Json(body): Json<EnhancePromptBody>,
) -> Result<Json<EnhancePromptResponse>, ApiError> {
    debug!(domain = %body.domain, project = ?body.project, "Enhancing prompt");

    let enhanced = state.guidance.enhance(body.into()).await?;

    Ok(Json(enhanced.into()))
}

/// POST /v1/guidance/retrieve
pub async fn retrieve_rules(
    State(state): State<AppState>,
    Json(body): Json<RetrieveRulesBody>,
) -> Result<Json<RetrieveRulesResponse>, ApiError> {
    let rules = state.guidance.retrieve(&body.prompt, &body.domain).await?;

    Ok(Json(RetrieveRulesResponse::new(rules)))
}

/// POST /v1/guidance/rules
pub async fn ingest_rule(
    State(state): State<AppState>,
    _auth: RequireIngestKey,
    Json(request): Json<IngestRuleRequest>,
) -> Result<(StatusCode, Json<IngestRuleResponse>), ApiError> {
    let outcome = state.guidance.ingest(request).await?;

    info!(
        id = %outcome.id,
        namespace = %outcome.namespace,
        created = outcome.created,
        "Rule ingested"
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.into())))
}

/// GET /v1/guidance/rules
pub async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<RulesQuery>,
) -> Result<Json<RulesListResponse>, ApiError> {
    let domain = query.domain.as_deref().filter(|d| !d.trim().is_empty());
    let rules = state.guidance.list(domain).await?;

    Ok(Json(RulesListResponse::new(rules)))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::mock::test_state;
    use crate::api::v1::create_v1_router;

    fn app(state: AppState) -> Router {
        Router::new().nest("/v1", create_v1_router()).with_state(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: Value, api_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn rule(domain: &str, text: &str) -> Value {
        json!({ "domain": domain, "topic": "Auth", "rule_text": text })
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let app = app(test_state());
        let body = rule("Backend", "Use RS256 for JWT");

        let (first_status, first) = send(
            app.clone(),
            post("/v1/guidance/rules", body.clone(), Some("ingest-secret")),
        )
        .await;
        let (second_status, second) =
            send(app, post("/v1/guidance/rules", body, Some("ingest-secret"))).await;

        assert_eq!(first_status, StatusCode::CREATED);
        assert_eq!(first["status"], "created");
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(second["status"], "exists");
        assert_eq!(first["id"], second["id"]);
    }

    #[tokio::test]
    async fn test_ingest_requires_key() {
        let (status, error) = send(
            app(test_state()),
            post("/v1/guidance/rules", rule("Backend", "Use RS256"), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_ingest_blank_rule_is_bad_request() {
        let (status, _) = send(
            app(test_state()),
            post("/v1/guidance/rules", rule("Backend", "   "), Some("ingest-secret")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enhance_applies_rules() {
        let state = test_state();
        state
            .guidance
            .ingest(IngestRuleRequest::new("Backend", "Auth", "Use RS256 for JWT"))
            .await
            .unwrap();

        let (status, body) = send(
            app(state),
            post(
                "/v1/guidance/enhance",
                json!({ "junior_prompt": "write a login handler", "domain": "Backend" }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules_count"], 1);
        assert_eq!(body["fallback_used"], true);
        assert_eq!(body["flagged"], false);
        assert!(body["enhanced_prompt"]
            .as_str()
            .unwrap()
            .contains("- [MANDATORY] Use RS256 for JWT"));
    }

    #[tokio::test]
    async fn test_enhance_without_rules_passes_prompt_through() {
        let (status, body) = send(
            app(test_state()),
            post(
                "/v1/guidance/enhance",
                json!({ "prompt": "write a login handler", "domain": "Backend" }),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules_count"], 0);
        assert_eq!(body["enhanced_prompt"], "write a login handler");
    }

    #[tokio::test]
    async fn test_retrieve_and_list() {
        let state = test_state();
        for (domain, text) in [("Backend", "Use RS256 for JWT"), ("Global", "Use structured logs")] {
            state
                .guidance
                .ingest(IngestRuleRequest::new(domain, "Topic", text))
                .await
                .unwrap();
        }
        let app = app(state);

        let (status, retrieved) = send(
            app.clone(),
            post(
                "/v1/guidance/retrieve",
                json!({ "prompt": "write a login handler", "domain": "Backend" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(retrieved["count"], 2);

        let (_, listed) = send(
            app,
            Request::builder()
                .uri("/v1/guidance/rules?domain=Backend")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["rules"][0]["rule_text"], "Use RS256 for JWT");
    }
}
