use crate::{record::CommentRecord, repo::CommentRepo};
use async_trait::async_trait;
use blog_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker, CommentUpdate},
};
use sqlx::{
    PgPool, query, query_as,
    migrate::{MigrateError, Migrator},
};
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Comment with id {0} was not found.")]
    CommentNotFound(Id<CommentMarker>),
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Comment storage in PostgreSQL. Every operation is a single autocommit statement.
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Brings the schema up to date with the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        debug!("Database migrations applied");

        Ok(())
    }
}

#[async_trait]
impl CommentRepo for DbClient {
    async fn list_all(&self) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.id,
                comments.name,
                comments.post,
                comments.text,
                comments.parent_comment_id,
                comments.date,
                comments.moderated
            FROM
                comments
            ORDER BY
                comments.date DESC,
                comments.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Comment::from).collect())
    }

    async fn list_for_post(&self, post: &str) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.id,
                comments.name,
                comments.post,
                comments.text,
                comments.parent_comment_id,
                comments.date,
                comments.moderated
            FROM
                comments
            WHERE
                comments.post = $1
            ORDER BY
                comments.date DESC,
                comments.id DESC
            ",
        )
        .bind(post)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Comment::from).collect())
    }

    async fn create(&self, content: &CommentContent) -> Result<Comment> {
        let record = query_as::<_, CommentRecord>(
            "
            INSERT INTO comments (name, post, text, parent_comment_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, post, text, parent_comment_id, date, moderated
            ",
        )
        .bind(&content.name)
        .bind(&content.post)
        .bind(&content.text)
        .bind(content.parent_comment_id.map(Id::get))
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn update(&self, id: Id<CommentMarker>, update: &CommentUpdate) -> Result<Comment> {
        let content = &update.content;
        let record = query_as::<_, CommentRecord>(
            "
            UPDATE comments
            SET
                name = $1,
                post = $2,
                text = $3,
                parent_comment_id = $4,
                moderated = $5
            WHERE
                comments.id = $6
            RETURNING id, name, post, text, parent_comment_id, date, moderated
            ",
        )
        .bind(&content.name)
        .bind(&content.post)
        .bind(&content.text)
        .bind(content.parent_comment_id.map(Id::get))
        .bind(update.moderated)
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::CommentNotFound(id))?;

        Ok(record.into())
    }

    async fn delete(&self, id: Id<CommentMarker>) -> Result<()> {
        let deleted = query("DELETE FROM comments WHERE comments.id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DbError::CommentNotFound(id));
        }

        Ok(())
    }
}
