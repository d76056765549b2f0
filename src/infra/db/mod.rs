//! Postgres-backed repository implementations.

mod comments;
mod util;

pub use util::map_sqlx_error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;
use crate::config::DatabaseSettings;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    query_timeout: Duration,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(settings.max_connections.get())
            .idle_timeout(settings.idle_timeout)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    /// Run `operation`, giving up after the configured query timeout.
    async fn bounded<T, F>(&self, operation: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, operation).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(RepoError::Timeout),
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.bounded(async { query("SELECT 1").execute(self.pool()).await.map(|_| ()) })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_rejected() {
        assert_eq!(PostgresRepositories::convert_count(7).expect("count"), 7);
        assert!(matches!(
            PostgresRepositories::convert_count(-1),
            Err(RepoError::Persistence(_))
        ));
    }
}
