//! Ports to the comment store and the upstream catalog.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::comments::NewComment;
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Locally stored comments. `count_for_title` is the aggregate the catalog merges into
/// movie records.
#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError>;

    /// Comments for a movie, newest first.
    async fn list_for_movie(&self, movie_name: &str) -> Result<Vec<CommentRecord>, RepoError>;

    async fn count_for_title(&self, title: &str) -> Result<u64, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogResource {
    Films,
    People,
}

impl CatalogResource {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogResource::Films => "films",
            CatalogResource::People => "people",
        }
    }
}

impl fmt::Display for CatalogResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("`{url}` responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read response body from `{url}`: {message}")]
    Body { url: String, message: String },
}

/// Raw access to the upstream catalog. Implementations return the response body
/// untouched; decoding belongs to the caller.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, resource: CatalogResource) -> Result<Bytes, FetchError>;
}

/// Envelope of an upstream list endpoint. Only the first page is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsPage<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamFilm {
    pub title: String,
    #[serde(default)]
    pub opening_crawl: String,
    pub release_date: String,
}
