//! Cache-fronted access to the upstream catalog.
//!
//! Every request resolves to one [`CacheKey`]. A hit decodes the stored list; a miss
//! fetches upstream, enriches or applies the character view, and writes the result back
//! with the entry TTL. Metadata is always recomputed over the list being returned, so
//! hits and misses produce the same response shape.
//!
//! A movie refresh reads the `movies` generation before fetching and again after its
//! write. If a comment bumped it in between, the fresh entry is cut down to the
//! invalidation TTL, since its counts may predate that comment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::aggregate::{
    AggregateError, DerivedMetadata, MovieMetadata, enrich_movies,
};
use crate::application::query::{CharacterView, apply_view, total_height_cm};
use crate::application::repos::{
    CatalogResource, CatalogSource, CommentsRepo, FetchError, ResultsPage, UpstreamFilm,
};
use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::domain::entities::{Character, EntityList, EntitySlice, Movie};

const METRIC_CACHE_HIT: &str = "holocron_cache_hit_total";
const METRIC_CACHE_MISS: &str = "holocron_cache_miss_total";
const METRIC_CACHE_READ_ERROR: &str = "holocron_cache_read_error_total";
const METRIC_REFRESH_MS: &str = "holocron_catalog_refresh_ms";
const METRIC_REFRESH_RACED: &str = "holocron_catalog_refresh_raced_total";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("upstream {resource} payload could not be decoded")]
    Decode {
        resource: CatalogResource,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("{kind} list could not be serialized for caching")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache write for `{key}` failed")]
    CacheWrite {
        key: String,
        #[source]
        source: CacheError,
    },
}

/// Whether a response was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoviesPayload {
    pub movies: Vec<Movie>,
    pub metadata: MovieMetadata,
    pub cache_status: CacheStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharactersPayload {
    pub characters: Vec<Character>,
    pub metadata: DerivedMetadata,
    pub cache_status: CacheStatus,
}

#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    comments: Arc<dyn CommentsRepo>,
    cache: Arc<dyn CacheStore>,
    entry_ttl: Duration,
    invalidation_ttl: Duration,
}

impl CatalogService {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        comments: Arc<dyn CommentsRepo>,
        cache: Arc<dyn CacheStore>,
        entry_ttl: Duration,
        invalidation_ttl: Duration,
    ) -> Self {
        Self {
            source,
            comments,
            cache,
            entry_ttl,
            invalidation_ttl,
        }
    }

    /// Films enriched with comment counts, oldest release first.
    pub async fn movies(&self) -> Result<MoviesPayload, CatalogError> {
        let key = CacheKey::Movies;
        if let Some(EntityList::Movies(movies)) = self.read_cached(&key).await {
            let metadata = MovieMetadata::for_movies(&movies);
            return Ok(MoviesPayload {
                movies,
                metadata,
                cache_status: CacheStatus::Hit,
            });
        }

        let started_at = Instant::now();
        let generation = self.generation(&key).await;
        let films: Vec<UpstreamFilm> = self.fetch_results(CatalogResource::Films).await?;
        let movies = enrich_movies(films, self.comments.as_ref()).await?;
        self.write_cached(&key, EntitySlice::Movies(&movies)).await?;
        match (generation, self.generation(&key).await) {
            (Some(before), Some(after)) if before == after => {}
            (before, after) => self.shorten_raced_entry(&key, before, after).await,
        }
        record_refresh(&key, started_at);

        let metadata = MovieMetadata::for_movies(&movies);
        Ok(MoviesPayload {
            movies,
            metadata,
            cache_status: CacheStatus::Miss,
        })
    }

    /// Characters seen through `view`, with height totals over exactly the returned list.
    pub async fn characters(&self, view: CharacterView) -> Result<CharactersPayload, CatalogError> {
        let key = CacheKey::Characters(view);
        if let Some(EntityList::Characters(characters)) = self.read_cached(&key).await {
            let metadata =
                DerivedMetadata::from_total(total_height_cm(&characters), characters.len());
            return Ok(CharactersPayload {
                characters,
                metadata,
                cache_status: CacheStatus::Hit,
            });
        }

        let started_at = Instant::now();
        let people: Vec<Character> = self.fetch_results(CatalogResource::People).await?;
        let result = apply_view(people, view);
        self.write_cached(&key, EntitySlice::Characters(&result.characters))
            .await?;
        record_refresh(&key, started_at);

        let metadata =
            DerivedMetadata::from_total(result.total_height_cm, result.characters.len());
        Ok(CharactersPayload {
            characters: result.characters,
            metadata,
            cache_status: CacheStatus::Miss,
        })
    }

    async fn fetch_results<T: DeserializeOwned>(
        &self,
        resource: CatalogResource,
    ) -> Result<Vec<T>, CatalogError> {
        let body = self.source.fetch(resource).await?;
        let page: ResultsPage<T> = serde_json::from_slice(&body)
            .map_err(|source| CatalogError::Decode { resource, source })?;
        debug!(
            target = "application::catalog",
            resource = %resource,
            count = page.results.len(),
            "upstream list fetched"
        );
        Ok(page.results)
    }

    /// Anything other than a decodable list of the key's own collection is a miss.
    async fn read_cached(&self, key: &CacheKey) -> Option<EntityList> {
        let collection = key.collection();
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "collection" => collection).increment(1);
                debug!(
                    target = "application::catalog",
                    key = %key,
                    outcome = "miss",
                    "cache lookup"
                );
                return None;
            }
            Err(err) => {
                counter!(METRIC_CACHE_READ_ERROR, "collection" => collection).increment(1);
                warn!(
                    target = "application::catalog",
                    key = %key,
                    backend = self.cache.backend(),
                    error = %err,
                    "cache read failed; treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_str::<EntityList>(&raw) {
            Ok(list) if list.kind() == collection => {
                counter!(METRIC_CACHE_HIT, "collection" => collection).increment(1);
                debug!(
                    target = "application::catalog",
                    key = %key,
                    outcome = "hit",
                    count = list.len(),
                    "cache lookup"
                );
                Some(list)
            }
            Ok(list) => {
                counter!(METRIC_CACHE_READ_ERROR, "collection" => collection).increment(1);
                warn!(
                    target = "application::catalog",
                    key = %key,
                    found = list.kind(),
                    "cached list has the wrong kind; treating as miss"
                );
                None
            }
            Err(err) => {
                counter!(METRIC_CACHE_READ_ERROR, "collection" => collection).increment(1);
                warn!(
                    target = "application::catalog",
                    key = %key,
                    error = %err,
                    "cached list could not be decoded; treating as miss"
                );
                None
            }
        }
    }

    async fn write_cached(
        &self,
        key: &CacheKey,
        list: EntitySlice<'_>,
    ) -> Result<(), CatalogError> {
        let raw = serde_json::to_string(&list).map_err(|source| CatalogError::Encode {
            kind: list.kind(),
            source,
        })?;
        self.cache
            .set_with_ttl(key, raw, self.entry_ttl)
            .await
            .map_err(|source| CatalogError::CacheWrite {
                key: key.to_string(),
                source,
            })?;
        debug!(
            target = "application::catalog",
            key = %key,
            ttl_secs = self.entry_ttl.as_secs(),
            count = list.len(),
            "cache entry written"
        );
        Ok(())
    }

    // A failed read counts as a change; the caller then shortens the entry.
    async fn generation(&self, key: &CacheKey) -> Option<u64> {
        match self.cache.generation(key).await {
            Ok(generation) => Some(generation),
            Err(err) => {
                warn!(
                    target = "application::catalog",
                    key = %key,
                    backend = self.cache.backend(),
                    error = %err,
                    "cache generation read failed"
                );
                None
            }
        }
    }

    async fn shorten_raced_entry(&self, key: &CacheKey, before: Option<u64>, after: Option<u64>) {
        counter!(METRIC_REFRESH_RACED, "collection" => key.collection()).increment(1);
        match self.cache.force_expire(key, self.invalidation_ttl).await {
            Ok(applied) => debug!(
                target = "application::catalog",
                key = %key,
                ?before,
                ?after,
                applied,
                ttl_ms = self.invalidation_ttl.as_millis() as u64,
                "refresh raced a change; entry lifetime shortened"
            ),
            Err(err) => warn!(
                target = "application::catalog",
                key = %key,
                backend = self.cache.backend(),
                error = %err,
                "failed to shorten raced cache entry"
            ),
        }
    }
}

fn record_refresh(key: &CacheKey, started_at: Instant) {
    histogram!(METRIC_REFRESH_MS, "collection" => key.collection())
        .record(started_at.elapsed().as_secs_f64() * 1000.0);
}
