//! Movie and character listings

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::catalog::CacheStatus;
use crate::application::query::CharacterView;

use super::{CACHE_STATUS_HEADER, CharacterListQuery, catalog_to_api};
use crate::infra::http::api::error::{ApiError, codes};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_movies(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let payload = state.catalog.movies().await.map_err(catalog_to_api)?;

    Ok(catalog_response(
        payload.movies,
        payload.metadata,
        "Movies retrieved",
        payload.cache_status,
    ))
}

pub async fn list_characters(
    State(state): State<ApiState>,
    Query(query): Query<CharacterListQuery>,
) -> Result<Response, ApiError> {
    let view = CharacterView::from_params(query.sort.as_deref(), query.gender.as_deref())
        .map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_QUERY,
                "Invalid query parameter",
                Some(err.to_string()),
            )
        })?;

    let payload = state
        .catalog
        .characters(view)
        .await
        .map_err(catalog_to_api)?;

    Ok(catalog_response(
        payload.characters,
        payload.metadata,
        "Characters retrieved",
        payload.cache_status,
    ))
}

fn catalog_response<E: Serialize, M: Serialize>(
    entities: Vec<E>,
    metadata: M,
    message: &'static str,
    cache_status: CacheStatus,
) -> Response {
    let body = CatalogResponse {
        entities,
        metadata,
        message,
        status: STATUS_SUCCESS,
    };
    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(cache_status.as_str()),
    );
    response
}
