pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::infra::http::middleware::{log_responses, set_request_context};

use self::error::ApiError;

/// Upper bound on request bodies.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/v1/movies", get(handlers::list_movies))
        .route("/v1/characters", get(handlers::list_characters))
        .route(
            "/v1/comments/{movie_name}",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/v1/healthcheck", get(handlers::healthcheck))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn not_found() -> Response {
    ApiError::not_found("Resource not found").into_response()
}

async fn method_not_allowed() -> Response {
    ApiError::method_not_allowed().into_response()
}
