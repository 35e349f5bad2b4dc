mod docs;
mod error;
mod state;
mod util;

pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, StreamSettings};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .route("/messages/stream", get(routes::stream::message_stream))
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
