//! Comment handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use url::Url;

use super::comment_to_api;
use crate::infra::http::api::client_ip::ClientIp;
use crate::infra::http::api::error::{ApiError, codes};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

const COMMENTS_BASE: &str = "http://localhost/v1/comments/";

pub async fn create_comment(
    State(state): State<ApiState>,
    Path(movie_name): Path<String>,
    ClientIp(commenter_ip): ClientIp,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(rejection_to_api)?;

    let record = state
        .comments
        .create(&payload.comment, &movie_name, &commenter_ip)
        .await
        .map_err(comment_to_api)?;

    let location = comment_location(&record.movie_name)?;
    let body = CommentCreatedResponse {
        comment: record,
        message: "Comment created",
        status: STATUS_SUCCESS,
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    ))
}

pub async fn list_comments(
    State(state): State<ApiState>,
    Path(movie_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state
        .comments
        .list_for_movie(&movie_name)
        .await
        .map_err(comment_to_api)?;

    Ok(Json(CommentListResponse {
        comments: list.comments,
        total_records: list.total_records,
        message: "Comments retrieved",
        status: STATUS_SUCCESS,
    }))
}

fn rejection_to_api(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Request body too large",
            None,
        );
    }
    ApiError::bad_request("Invalid request body", Some(rejection.body_text()))
}

/// Percent-encoded `/v1/comments/{movie_name}` path.
fn comment_location(movie_name: &str) -> Result<String, ApiError> {
    let mut url = Url::parse(COMMENTS_BASE).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Location could not be built",
            None,
        )
        .with_source("infra::http::api::comments", &err)
    })?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(movie_name);
    }
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_encodes_the_movie_name() {
        let location = comment_location("A New Hope").expect("location");
        assert_eq!(location, "/v1/comments/A%20New%20Hope");
    }

    #[test]
    fn location_escapes_slashes() {
        let location = comment_location("a/b").expect("location");
        assert_eq!(location, "/v1/comments/a%2Fb");
    }
}
