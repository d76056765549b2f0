#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use time::OffsetDateTime;

use holocron::application::catalog::CatalogService;
use holocron::application::comments::CommentService;
use holocron::application::repos::{
    CatalogResource, CatalogSource, CommentsRepo, FetchError, RepoError,
};
use holocron::cache::{CacheConfig, CacheStore, MemoryCacheStore};
use holocron::domain::comments::NewComment;
use holocron::domain::entities::CommentRecord;

pub const ENTRY_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const INVALIDATION_TTL: Duration = Duration::from_secs(1);

/// Upstream fake serving fixed bodies and counting requests per resource.
pub struct StaticSource {
    films: Mutex<Result<Bytes, u16>>,
    people: Mutex<Result<Bytes, u16>>,
    film_fetches: AtomicUsize,
    people_fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(films: serde_json::Value, people: serde_json::Value) -> Self {
        Self {
            films: Mutex::new(Ok(Bytes::from(films.to_string()))),
            people: Mutex::new(Ok(Bytes::from(people.to_string()))),
            film_fetches: AtomicUsize::new(0),
            people_fetches: AtomicUsize::new(0),
        }
    }

    pub fn standard() -> Self {
        Self::new(films_fixture(), people_fixture())
    }

    pub fn set_raw(&self, resource: CatalogResource, body: &'static str) {
        *self.slot(resource).lock().expect("source lock") = Ok(Bytes::from_static(body.as_bytes()));
    }

    pub fn fail_with_status(&self, resource: CatalogResource, status: u16) {
        *self.slot(resource).lock().expect("source lock") = Err(status);
    }

    pub fn fetches(&self, resource: CatalogResource) -> usize {
        match resource {
            CatalogResource::Films => self.film_fetches.load(Ordering::SeqCst),
            CatalogResource::People => self.people_fetches.load(Ordering::SeqCst),
        }
    }

    fn slot(&self, resource: CatalogResource) -> &Mutex<Result<Bytes, u16>> {
        match resource {
            CatalogResource::Films => &self.films,
            CatalogResource::People => &self.people,
        }
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch(&self, resource: CatalogResource) -> Result<Bytes, FetchError> {
        match resource {
            CatalogResource::Films => self.film_fetches.fetch_add(1, Ordering::SeqCst),
            CatalogResource::People => self.people_fetches.fetch_add(1, Ordering::SeqCst),
        };
        let url = format!("https://swapi.test/api/{resource}/");
        match &*self.slot(resource).lock().expect("source lock") {
            Ok(body) => Ok(body.clone()),
            Err(status) => Err(FetchError::Status {
                url,
                status: *status,
            }),
        }
    }
}

/// Comment store fake. Counts are derived from the stored rows.
#[derive(Default)]
pub struct MemoryComments {
    rows: Mutex<Vec<CommentRecord>>,
    fail_counts: AtomicBool,
    unhealthy: AtomicBool,
}

impl MemoryComments {
    pub fn fail_counts(&self) {
        self.fail_counts.store(true, Ordering::SeqCst);
    }

    pub fn mark_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommentsRepo for MemoryComments {
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let record = CommentRecord {
            id: rows.len() as i64 + 1,
            created_at: OffsetDateTime::now_utc(),
            comment: comment.comment,
            movie_name: comment.movie_name,
            commenter_ip: comment.commenter_ip,
            version: 1,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn list_for_movie(&self, movie_name: &str) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = self.rows.lock().expect("rows lock");
        let mut matching: Vec<_> = rows
            .iter()
            .filter(|row| row.movie_name == movie_name)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(matching)
    }

    async fn count_for_title(&self, title: &str) -> Result<u64, RepoError> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows.iter().filter(|row| row.movie_name == title).count() as u64)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub source: Arc<StaticSource>,
    pub comments_repo: Arc<MemoryComments>,
    pub cache: Arc<MemoryCacheStore>,
    pub catalog: Arc<CatalogService>,
    pub comments: Arc<CommentService>,
}

impl Harness {
    pub fn new(source: StaticSource) -> Self {
        let source = Arc::new(source);
        let comments_repo = Arc::new(MemoryComments::default());
        let cache = Arc::new(MemoryCacheStore::new(&CacheConfig::default()));

        let catalog = Arc::new(CatalogService::new(
            source.clone(),
            comments_repo.clone(),
            cache.clone() as Arc<dyn CacheStore>,
            ENTRY_TTL,
            INVALIDATION_TTL,
        ));
        let comments = Arc::new(CommentService::new(
            comments_repo.clone(),
            cache.clone() as Arc<dyn CacheStore>,
            INVALIDATION_TTL,
        ));

        Self {
            source,
            comments_repo,
            cache,
            catalog,
            comments,
        }
    }
}

pub fn films_fixture() -> serde_json::Value {
    json!({
        "count": 3,
        "next": null,
        "results": [
            {
                "title": "Attack of the Clones",
                "episode_id": 2,
                "opening_crawl": "There is unrest in the Galactic Senate.",
                "release_date": "2002-05-16"
            },
            {
                "title": "A New Hope",
                "episode_id": 4,
                "opening_crawl": "It is a period of civil war.",
                "release_date": "1977-05-25"
            },
            {
                "title": "The Empire Strikes Back",
                "episode_id": 5,
                "opening_crawl": "It is a dark time for the Rebellion.",
                "release_date": "1980-05-21"
            }
        ]
    })
}

pub fn people_fixture() -> serde_json::Value {
    json!({
        "count": 3,
        "next": null,
        "results": [
            { "name": "Luke Skywalker", "height": "150", "mass": "77", "gender": "male" },
            { "name": "Leia Organa", "height": "170", "mass": "49", "gender": "female" },
            { "name": "Owen Lars", "height": "165", "mass": "120", "gender": "male" }
        ]
    })
}
