use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{CommentsRepo, RepoError};
use crate::cache::{CacheKey, CacheStore};
use crate::domain::comments::NewComment;
use crate::domain::entities::CommentRecord;
use crate::domain::error::DomainError;

const METRIC_CACHE_EXPIRE: &str = "holocron_cache_expire_total";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentList {
    pub comments: Vec<CommentRecord>,
    pub total_records: usize,
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
    cache: Arc<dyn CacheStore>,
    invalidation_ttl: Duration,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentsRepo>,
        cache: Arc<dyn CacheStore>,
        invalidation_ttl: Duration,
    ) -> Self {
        Self {
            comments,
            cache,
            invalidation_ttl,
        }
    }

    /// Store a comment, bump the movie list generation and shorten the cached list's
    /// lifetime so the next read picks up the new count.
    pub async fn create(
        &self,
        comment: &str,
        movie_name: &str,
        commenter_ip: &str,
    ) -> Result<CommentRecord, CommentError> {
        let new_comment = NewComment::new(comment, movie_name, commenter_ip)?;
        let record = self.comments.insert_comment(new_comment).await?;

        info!(
            target = "application::comments::create",
            id = record.id,
            movie_name = %record.movie_name,
            "comment stored"
        );

        self.expire_movies().await;
        Ok(record)
    }

    pub async fn list_for_movie(&self, movie_name: &str) -> Result<CommentList, CommentError> {
        let movie_name = movie_name.trim();
        if movie_name.is_empty() {
            return Err(DomainError::validation("movie_name", "is required").into());
        }
        let comments = self.comments.list_for_movie(movie_name).await?;
        Ok(CommentList {
            total_records: comments.len(),
            comments,
        })
    }

    // Failures are logged only; the comment is already persisted. The generation bump
    // comes first so a refresh already in flight sees it.
    async fn expire_movies(&self) {
        let key = CacheKey::Movies;
        if let Err(err) = self.cache.bump_generation(&key).await {
            warn!(
                target = "application::comments::create",
                key = %key,
                backend = self.cache.backend(),
                error = %err,
                "failed to bump movie list generation"
            );
        }
        match self.cache.force_expire(&key, self.invalidation_ttl).await {
            Ok(applied) => {
                counter!(METRIC_CACHE_EXPIRE, "collection" => key.collection()).increment(1);
                debug!(
                    target = "application::comments::create",
                    key = %key,
                    applied,
                    ttl_ms = self.invalidation_ttl.as_millis() as u64,
                    "movie list expiry shortened"
                );
            }
            Err(err) => {
                warn!(
                    target = "application::comments::create",
                    key = %key,
                    backend = self.cache.backend(),
                    error = %err,
                    "failed to shorten movie list expiry"
                );
            }
        }
    }
}
