use axum::{
    Json, Router,
    http::HeaderName,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;

use crate::{
    app_state::AppState,
    error::ApiError,
    health::health_check,
    prices::handlers::{
        clear_manual_prices, get_prices, get_status, refresh_prices, save_manual_prices,
    },
    shopping::handlers::{create_shopping_list, list_reminder_lists},
    specials::handlers::get_specials,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(OpenApi)]
#[openapi(
    info(title = "pricewatch", description = "Grocery price cache and shopping list API"),
    paths(
        crate::health::health_check,
        crate::prices::handlers::get_prices,
        crate::prices::handlers::refresh_prices,
        crate::prices::handlers::get_status,
        crate::prices::handlers::save_manual_prices,
        crate::prices::handlers::clear_manual_prices,
        crate::shopping::handlers::create_shopping_list,
        crate::shopping::handlers::list_reminder_lists,
        crate::specials::handlers::get_specials,
    ),
    components(schemas(
        crate::prices::dtos::ManualPriceEntry,
        crate::prices::model::QuoteSource,
        crate::prices::model::ScrapeMethod,
        crate::specials::dtos::SpecialSource,
    )),
    tags(
        (name = "prices", description = "Cached grocery prices"),
        (name = "shopping", description = "Shopping list reminders"),
        (name = "specials", description = "Specials from listings and search results"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// All routes with tracing, request ids and panic recovery.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/prices", get(get_prices))
        .route("/api/prices/refresh", post(refresh_prices))
        .route("/api/prices/status", get(get_status))
        .route(
            "/api/prices/manual",
            post(save_manual_prices).delete(clear_manual_prices),
        )
        .route("/api/shopping-list", post(create_shopping_list))
        .route("/api/reminders/lists", get(list_reminder_lists))
        .route("/api/specials", get(get_specials))
        .route("/api/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("handler panicked");
    ApiError::Internal("Internal server error".to_string()).into_response()
}
