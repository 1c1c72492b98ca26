use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::cache::CacheStatus;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub cache: CacheStatus,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.prices.status().await.status;
    debug!(?cache, "health check");
    Json(HealthResponse {
        status: "OK".to_string(),
        cache,
    })
}
