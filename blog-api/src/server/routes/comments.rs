use crate::server::{Result, ServerError, ServerRouter, json::Json, payload::Payload};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use blog_common::model::{
    Id,
    comment::{Comment, CommentForm, CommentMarker},
};
use blog_db::repo::CommentRepo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(list_post_comments)
        .typed_put(update_comment)
        .typed_delete(delete_comment)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: String,
    id: Id<CommentMarker>,
}

impl StatusResponse {
    fn success(id: Id<CommentMarker>, message: String) -> Self {
        Self {
            status: "success",
            message,
            id,
        }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments", rejection(ServerError))]
struct CommentsPath();

// The post listing and the single-comment routes share one capture name, since a router
// cannot hold two differently named parameters at the same position.
#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{key}", rejection(ServerError))]
struct PostCommentsPath(String);

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{key}", rejection(ServerError))]
struct CommentPath(Id<CommentMarker>);

async fn list_comments(
    CommentsPath(): CommentsPath,
    State(comments): State<Arc<dyn CommentRepo>>,
) -> Result<Json<Vec<Comment>>> {
    let comments = comments.list_all().await?;

    Ok(Json(comments))
}

async fn list_post_comments(
    PostCommentsPath(post): PostCommentsPath,
    State(comments): State<Arc<dyn CommentRepo>>,
) -> Result<Json<Vec<Comment>>> {
    let comments = comments.list_for_post(&post).await?;

    Ok(Json(comments))
}

async fn create_comment(
    CommentsPath(): CommentsPath,
    State(comments): State<Arc<dyn CommentRepo>>,
    Payload(form): Payload<CommentForm>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let content = form.into_content()?;
    let comment = comments.create(&content).await?;

    info!(id = %comment.id, post = %comment.post, "Comment added");

    let response = StatusResponse::success(comment.id, "Comment added.".to_owned());
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_comment(
    CommentPath(id): CommentPath,
    State(comments): State<Arc<dyn CommentRepo>>,
    Payload(form): Payload<CommentForm>,
) -> Result<Json<StatusResponse>> {
    let update = form.into_update()?;
    let comment = comments.update(id, &update).await?;

    info!(%id, moderated = comment.moderated, "Comment modified");

    let message = format!("Comment modified with ID: {id}");
    Ok(Json(StatusResponse::success(id, message)))
}

async fn delete_comment(
    CommentPath(id): CommentPath,
    State(comments): State<Arc<dyn CommentRepo>>,
) -> Result<Json<StatusResponse>> {
    comments.delete(id).await?;

    info!(%id, "Comment deleted");

    let message = format!("Comment deleted with ID: {id}");
    Ok(Json(StatusResponse::success(id, message)))
}
