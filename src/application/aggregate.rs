//! Merges upstream records with local aggregates and derives response metadata.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::application::repos::{CommentsRepo, RepoError, UpstreamFilm};
use crate::domain::entities::{Movie, release_date};

const CM_PER_FOOT: f64 = 30.48;
const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("release date `{value}` of `{title}` is not a YYYY-MM-DD date")]
    ReleaseDate {
        title: String,
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("comment count lookup for `{title}` failed")]
    CommentCount {
        title: String,
        #[source]
        source: RepoError,
    },
}

/// Height totals over the exact character list being returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetadata {
    pub total_height_in_feet: f64,
    pub total_height_in_inches: f64,
    pub count: usize,
}

impl DerivedMetadata {
    pub fn from_total(total_height_cm: i64, count: usize) -> Self {
        let total = total_height_cm as f64;
        Self {
            total_height_in_feet: round2(total / CM_PER_FOOT),
            total_height_in_inches: round2(total / CM_PER_INCH),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovieMetadata {
    pub count: usize,
    pub total_comments: u64,
}

impl MovieMetadata {
    pub fn for_movies(movies: &[Movie]) -> Self {
        Self {
            count: movies.len(),
            total_comments: movies.iter().map(|movie| movie.comment_count).sum(),
        }
    }
}

/// Parse release dates, attach comment counts and order chronologically.
///
/// Any failure aborts the whole list; there is no partial result.
pub async fn enrich_movies(
    films: Vec<UpstreamFilm>,
    comments: &dyn CommentsRepo,
) -> Result<Vec<Movie>, AggregateError> {
    let mut movies = Vec::with_capacity(films.len());
    for film in films {
        let release_date = release_date::parse(&film.release_date).map_err(|source| {
            AggregateError::ReleaseDate {
                title: film.title.clone(),
                value: film.release_date.clone(),
                source,
            }
        })?;

        let comment_count = comments
            .count_for_title(&film.title)
            .await
            .map_err(|source| AggregateError::CommentCount {
                title: film.title.clone(),
                source,
            })?;

        debug!(
            target = "application::aggregate::enrich_movies",
            title = %film.title,
            comment_count,
            "movie enriched"
        );

        movies.push(Movie {
            title: film.title,
            opening_crawl: film.opening_crawl,
            release_date,
            comment_count,
        });
    }

    movies.sort_by_key(|movie| movie.release_date);
    Ok(movies)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::macros::date;

    use super::*;
    use crate::domain::comments::NewComment;
    use crate::domain::entities::CommentRecord;

    #[derive(Default)]
    struct CountingRepo {
        counts: HashMap<String, u64>,
        failing_title: Option<String>,
    }

    #[async_trait]
    impl CommentsRepo for CountingRepo {
        async fn insert_comment(&self, _comment: NewComment) -> Result<CommentRecord, RepoError> {
            Err(RepoError::from_persistence("read-only test repo"))
        }

        async fn list_for_movie(&self, _movie_name: &str) -> Result<Vec<CommentRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn count_for_title(&self, title: &str) -> Result<u64, RepoError> {
            if self.failing_title.as_deref() == Some(title) {
                return Err(RepoError::Timeout);
            }
            Ok(self.counts.get(title).copied().unwrap_or(0))
        }

        async fn health_check(&self) -> Result<(), RepoError> {
            Ok(())
        }
    }

    fn film(title: &str, release_date: &str) -> UpstreamFilm {
        UpstreamFilm {
            title: title.to_string(),
            opening_crawl: format!("{title} crawl"),
            release_date: release_date.to_string(),
        }
    }

    #[test]
    fn metadata_converts_centimeters() {
        let metadata = DerivedMetadata::from_total(315, 2);
        assert_eq!(metadata.count, 2);
        assert_eq!(metadata.total_height_in_feet, 10.33);
        assert_eq!(metadata.total_height_in_inches, 124.02);
    }

    #[test]
    fn metadata_for_empty_list_is_zero() {
        let metadata = DerivedMetadata::from_total(0, 0);
        assert_eq!(metadata.total_height_in_feet, 0.0);
        assert_eq!(metadata.total_height_in_inches, 0.0);
        assert_eq!(metadata.count, 0);
    }

    #[tokio::test]
    async fn movies_are_ordered_by_release_date() {
        let repo = CountingRepo {
            counts: HashMap::from([("A New Hope".to_string(), 4)]),
            ..Default::default()
        };
        let films = vec![
            film("Attack of the Clones", "2002-05-16"),
            film("A New Hope", "1977-05-25"),
            film("The Empire Strikes Back", "1980-05-21"),
        ];

        let movies = enrich_movies(films, &repo).await.expect("enriched movies");

        let dates: Vec<_> = movies.iter().map(|m| m.release_date).collect();
        assert_eq!(
            dates,
            [date!(1977 - 05 - 25), date!(1980 - 05 - 21), date!(2002 - 05 - 16)]
        );
        assert_eq!(movies[0].comment_count, 4);
        assert_eq!(movies[1].comment_count, 0);
        assert_eq!(MovieMetadata::for_movies(&movies).total_comments, 4);
    }

    #[tokio::test]
    async fn malformed_release_date_aborts_everything() {
        let repo = CountingRepo::default();
        let films = vec![
            film("A New Hope", "1977-05-25"),
            film("Holiday Special", "November 1978"),
        ];

        let err = enrich_movies(films, &repo).await.unwrap_err();
        assert!(matches!(
            err,
            AggregateError::ReleaseDate { ref title, .. } if title == "Holiday Special"
        ));
    }

    #[tokio::test]
    async fn comment_lookup_failure_aborts_everything() {
        let repo = CountingRepo {
            failing_title: Some("Return of the Jedi".to_string()),
            ..Default::default()
        };
        let films = vec![
            film("Return of the Jedi", "1983-05-25"),
            film("A New Hope", "1977-05-25"),
        ];

        let err = enrich_movies(films, &repo).await.unwrap_err();
        assert!(matches!(
            err,
            AggregateError::CommentCount {
                source: RepoError::Timeout,
                ..
            }
        ));
    }
}
