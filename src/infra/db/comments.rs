use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::{
    application::repos::{CommentsRepo, RepoError},
    domain::{comments::NewComment, entities::CommentRecord},
};

use super::PostgresRepositories;

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    created_at: OffsetDateTime,
    comment: String,
    movie_name: String,
    commenter_ip: String,
    version: i32,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            comment: row.comment,
            movie_name: row.movie_name,
            commenter_ip: row.commenter_ip,
            version: row.version,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, RepoError> {
        let row = self
            .bounded(
                query_as::<_, CommentRow>(
                    r#"
                    INSERT INTO comments (comment, movie_name, commenter_ip)
                    VALUES ($1, $2, $3)
                    RETURNING id, created_at, comment, movie_name, commenter_ip, version
                    "#,
                )
                .bind(&comment.comment)
                .bind(&comment.movie_name)
                .bind(&comment.commenter_ip)
                .fetch_one(self.pool()),
            )
            .await?;

        Ok(CommentRecord::from(row))
    }

    async fn list_for_movie(&self, movie_name: &str) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = self
            .bounded(
                query_as::<_, CommentRow>(
                    r#"
                    SELECT id, created_at, comment, movie_name, commenter_ip, version
                    FROM comments
                    WHERE movie_name = $1
                    ORDER BY id DESC
                    "#,
                )
                .bind(movie_name)
                .fetch_all(self.pool()),
            )
            .await?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn count_for_title(&self, title: &str) -> Result<u64, RepoError> {
        let (count,): (i64,) = self
            .bounded(
                query_as("SELECT COUNT(*) FROM comments WHERE movie_name = $1")
                    .bind(title)
                    .fetch_one(self.pool()),
            )
            .await?;

        Self::convert_count(count)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await
    }
}
