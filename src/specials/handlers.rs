use axum::{Json, extract::State};

use crate::{app_state::AppState, specials::dtos::SpecialsResponse};

/// Always 200; sources that failed are listed in `data.failures`.
#[utoipa::path(
    get,
    path = "/api/specials",
    tag = "specials",
    responses(
        (status = 200, description = "Specials from store listings, catalogues and search results", body = SpecialsResponse)
    )
)]
pub async fn get_specials(State(state): State<AppState>) -> Json<SpecialsResponse> {
    let data = state.specials.collect(state.prices.catalog()).await;
    Json(SpecialsResponse {
        success: true,
        data,
    })
}
