use crate::{
    client::{DbError, Result},
    repo::CommentRepo,
};
use async_trait::async_trait;
use blog_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker, CommentUpdate},
};
use std::cmp::Reverse;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Process-local comment storage, used when no database is configured.
///
/// Comments are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCommentRepo {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    comments: Vec<Comment>,
}

impl MemoryCommentRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by_key(|comment| Reverse((comment.date, comment.id)));
    comments
}

#[async_trait]
impl CommentRepo for MemoryCommentRepo {
    async fn list_all(&self) -> Result<Vec<Comment>> {
        let state = self.state.read().await;

        Ok(newest_first(state.comments.clone()))
    }

    async fn list_for_post(&self, post: &str) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        let comments = state
            .comments
            .iter()
            .filter(|comment| comment.post == post)
            .cloned()
            .collect();

        Ok(newest_first(comments))
    }

    async fn create(&self, content: &CommentContent) -> Result<Comment> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let comment = Comment {
            id: Id::new(state.last_id),
            name: content.name.clone(),
            text: content.text.clone(),
            post: content.post.clone(),
            parent_comment_id: content.parent_comment_id,
            date: OffsetDateTime::now_utc(),
            moderated: false,
        };
        state.comments.push(comment.clone());

        Ok(comment)
    }

    async fn update(&self, id: Id<CommentMarker>, update: &CommentUpdate) -> Result<Comment> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or(DbError::CommentNotFound(id))?;

        comment.name.clone_from(&update.content.name);
        comment.text.clone_from(&update.content.text);
        comment.post.clone_from(&update.content.post);
        comment.parent_comment_id = update.content.parent_comment_id;
        comment.moderated = update.moderated;

        Ok(comment.clone())
    }

    async fn delete(&self, id: Id<CommentMarker>) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or(DbError::CommentNotFound(id))?;
        state.comments.remove(index);

        Ok(())
    }
}
