use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::collections::BTreeMap;
use tracing::info;

use crate::{
    app_state::AppState,
    error::{ApiError, ErrorResponse, ValidationError},
    prices::{
        dtos::{
            ManualClearResponse, ManualPriceEntry, ManualPricesRequest, ManualSaveResponse,
            StatusResponse,
        },
        model::PriceSnapshot,
    },
};

#[utoipa::path(
    get,
    path = "/api/prices",
    tag = "prices",
    responses(
        (status = 200, description = "Cached prices, refreshed first when stale", body = PriceSnapshot),
        (status = 500, description = "Cache could not be written", body = ErrorResponse)
    )
)]
pub async fn get_prices(State(state): State<AppState>) -> Result<Json<PriceSnapshot>, ApiError> {
    Ok(Json(state.prices.current().await?))
}

#[utoipa::path(
    post,
    path = "/api/prices/refresh",
    tag = "prices",
    responses(
        (status = 200, description = "Freshly scraped prices", body = PriceSnapshot),
        (status = 500, description = "Cache could not be written", body = ErrorResponse)
    )
)]
pub async fn refresh_prices(
    State(state): State<AppState>,
) -> Result<Json<PriceSnapshot>, ApiError> {
    info!("manual refresh requested");
    Ok(Json(state.prices.refresh().await?))
}

#[utoipa::path(
    get,
    path = "/api/prices/status",
    tag = "prices",
    responses(
        (status = 200, description = "Cache age and contents summary", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.prices.status().await)
}

/// Body: `{ "<store>": { "<product_id>": {price, name?, special?, special_price?} } }`.
#[utoipa::path(
    post,
    path = "/api/prices/manual",
    tag = "prices",
    request_body = BTreeMap<String, BTreeMap<String, ManualPriceEntry>>,
    responses(
        (status = 200, description = "Entries merged into the cache", body = ManualSaveResponse),
        (status = 400, description = "Malformed or invalid entries", body = ErrorResponse),
        (status = 500, description = "Cache could not be written", body = ErrorResponse)
    )
)]
pub async fn save_manual_prices(
    State(state): State<AppState>,
    payload: Result<Json<ManualPricesRequest>, JsonRejection>,
) -> Result<Json<ManualSaveResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ValidationError::new(e.body_text()))?;
    let saved = state.prices.save_manual(request).await?;
    Ok(Json(ManualSaveResponse {
        status: "saved".to_string(),
        prices: saved.snapshot,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/prices/manual",
    tag = "prices",
    responses(
        (status = 200, description = "Manual entries removed", body = ManualClearResponse),
        (status = 500, description = "Cache could not be written", body = ErrorResponse)
    )
)]
pub async fn clear_manual_prices(
    State(state): State<AppState>,
) -> Result<Json<ManualClearResponse>, ApiError> {
    let cleared = state.prices.clear_manual().await?;
    Ok(Json(ManualClearResponse {
        status: "cleared".to_string(),
        prices: cleared.map(|s| s.snapshot),
    }))
}
