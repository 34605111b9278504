//! Ingestion key authentication

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Extractor that requires the configured ingestion key
///
/// Extracts the key from either:
/// - Authorization header: `Bearer <key>`
/// - X-API-Key header: `<key>`
#[derive(Debug, Clone, Copy)]
pub struct RequireIngestKey;

impl FromRequestParts<AppState> for RequireIngestKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.ingest_api_key.as_deref() else {
            return Err(ApiError::forbidden(
                "Rule ingestion is disabled: no ingest API key is configured",
            ));
        };

        let provided = extract_api_key_from_headers(&parts.headers)?;

        debug!(
            key_prefix = %provided.chars().take(4).collect::<String>(),
            "Validating ingest key"
        );

        if provided != expected {
            warn!("Rejected rule ingestion with an invalid key");
            return Err(ApiError::unauthorized("Invalid API key"));
        }

        Ok(RequireIngestKey)
    }
}

fn extract_api_key_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(api_key_header) = headers.get("x-api-key") {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?;

        return Ok(key.trim().to_string());
    }

    Err(ApiError::unauthorized(
        "API key required. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header",
    ))
}
