//! Optimization endpoint

use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::optimization::{OptimizeRequest, OptimizeResponse};

/// POST /v1/optimize
pub async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    info!(
        org_id = %request.org_id,
        language = %request.context.language,
        "Optimization requested"
    );

    let response = state.orchestrator.resolve(&request).await?;

    Ok(Json(response))
}
