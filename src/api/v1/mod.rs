//! v1 API endpoints

pub mod guidance;
pub mod optimize;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/optimize", post(optimize::optimize))
        .route("/guidance/enhance", post(guidance::enhance_prompt))
        .route("/guidance/retrieve", post(guidance::retrieve_rules))
        .route(
            "/guidance/rules",
            get(guidance::list_rules).post(guidance::ingest_rule),
        )
}
