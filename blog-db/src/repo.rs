use crate::client::Result;
use async_trait::async_trait;
use blog_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker, CommentUpdate},
};

/// Storage for comments. Listings are newest first.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Comment>>;

    /// Comments whose `post` is exactly `post`.
    async fn list_for_post(&self, post: &str) -> Result<Vec<Comment>>;

    /// Stores a new, unmoderated comment and returns it with its id and date.
    async fn create(&self, content: &CommentContent) -> Result<Comment>;

    /// Replaces every mutable column of the comment. The date is kept.
    async fn update(&self, id: Id<CommentMarker>, update: &CommentUpdate) -> Result<Comment>;

    async fn delete(&self, id: Id<CommentMarker>) -> Result<()>;
}
