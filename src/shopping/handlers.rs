use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    app_state::AppState,
    error::{ApiError, ErrorResponse, ValidationError},
    shopping::dtos::{ReminderListsResponse, ShoppingListRequest, ShoppingListResponse},
};

#[utoipa::path(
    post,
    path = "/api/shopping-list",
    tag = "shopping",
    request_body = ShoppingListRequest,
    responses(
        (status = 200, description = "Per-line results; individual failures are reported, not fatal", body = ShoppingListResponse),
        (status = 400, description = "No ingredients or malformed body", body = ErrorResponse)
    )
)]
pub async fn create_shopping_list(
    State(state): State<AppState>,
    payload: Result<Json<ShoppingListRequest>, JsonRejection>,
) -> Result<Json<ShoppingListResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ValidationError::new(e.body_text()))?;
    request.validate()?;
    let response = state
        .reminders
        .add_all(&request.ingredients, request.list_name())
        .await;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/reminders/lists",
    tag = "shopping",
    responses(
        (status = 200, description = "Reminder lists known to the reminders app", body = ReminderListsResponse),
        (status = 500, description = "Reminders command could not be run", body = ErrorResponse)
    )
)]
pub async fn list_reminder_lists(
    State(state): State<AppState>,
) -> Result<Json<ReminderListsResponse>, ApiError> {
    let lists = state
        .reminders
        .lists()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(ReminderListsResponse {
        success: true,
        lists,
    }))
}
