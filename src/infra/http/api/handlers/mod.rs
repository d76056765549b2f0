//! API handlers organized by resource type.
//!
//! Error conversion helpers are defined here and shared across modules.

mod catalog;
mod comments;
mod health;

pub use catalog::*;
pub use comments::*;
pub use health::*;

use axum::http::StatusCode;
use serde::Deserialize;

use crate::application::aggregate::AggregateError;
use crate::application::catalog::CatalogError;
use crate::application::comments::CommentError;
use crate::application::repos::{FetchError, RepoError};

use super::error::{ApiError, codes};

pub(crate) const CACHE_STATUS_HEADER: &str = "x-cache";

#[derive(Debug, Default, Deserialize)]
pub struct CharacterListQuery {
    pub sort: Option<String>,
    pub gender: Option<String>,
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    const SOURCE: &str = "infra::http::api::catalog";
    let api = match &err {
        CatalogError::Fetch(fetch) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::UPSTREAM,
            "Upstream catalog unavailable",
            Some(fetch_hint(fetch)),
        ),
        CatalogError::Decode { resource, .. } => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::UPSTREAM_PAYLOAD,
            "Upstream catalog returned an unreadable payload",
            Some(format!("{resource} response did not match the expected shape")),
        ),
        CatalogError::Aggregate(AggregateError::CommentCount { title, .. }) => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::COMMENT_COUNT,
            "Comment count unavailable",
            Some(format!("no comment count for `{title}`")),
        ),
        CatalogError::Aggregate(AggregateError::ReleaseDate { .. }) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CATALOG,
            "Catalog data could not be processed",
            None,
        ),
        CatalogError::Encode { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CATALOG,
            "Catalog data could not be processed",
            None,
        ),
        CatalogError::CacheWrite { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CACHE,
            "Cache unavailable",
            None,
        ),
    };
    api.with_source(SOURCE, &err)
}

fn fetch_hint(err: &FetchError) -> String {
    match err {
        FetchError::Status { status, .. } => format!("upstream responded with status {status}"),
        FetchError::Transport { .. } => "upstream could not be reached".to_string(),
        FetchError::Body { .. } => "upstream response body could not be read".to_string(),
    }
}

pub(crate) fn comment_to_api(err: CommentError) -> ApiError {
    match err {
        CommentError::Validation(err) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(err.to_string()),
        ),
        CommentError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    const SOURCE: &str = "infra::http::api::repo";
    let api = match &err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint.clone()),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message.clone()),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message.clone()),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            None,
        ),
    };
    api.with_source(SOURCE, &err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::CatalogResource;

    #[test]
    fn catalog_errors_map_to_documented_statuses() {
        let fetch = CatalogError::Fetch(FetchError::Status {
            url: "https://swapi.dev/api/films/".to_string(),
            status: 500,
        });
        assert_eq!(catalog_to_api(fetch).status(), StatusCode::BAD_GATEWAY);

        let decode = CatalogError::Decode {
            resource: CatalogResource::People,
            source: serde_json::from_str::<u8>("{").unwrap_err(),
        };
        let api = catalog_to_api(decode);
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api.code(), codes::UPSTREAM_PAYLOAD);

        let count = CatalogError::Aggregate(AggregateError::CommentCount {
            title: "A New Hope".to_string(),
            source: RepoError::Timeout,
        });
        assert_eq!(catalog_to_api(count).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_is_a_bad_request() {
        let err = CommentError::Validation(crate::domain::error::DomainError::validation(
            "comment",
            "is too short",
        ));
        let api = comment_to_api(err);
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), codes::INVALID_INPUT);
    }

    #[test]
    fn repo_timeout_is_unavailable() {
        let api = repo_to_api(RepoError::Timeout);
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.code(), codes::DB_TIMEOUT);
    }
}
