use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use blog_common::{content::PostCollection, model::comment::CommentValidationError};
use blog_db::{client::DbError, repo::CommentRepo};
use json::Json;
use serde::Serialize;
use std::{path::Path, sync::Arc};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::error;

mod json;
mod payload;
mod routes;

pub type ServerRouter = Router<ServerState>;

/// Shared handler state. Building one requires the posts to be loaded already.
#[derive(Clone, FromRef)]
pub struct ServerState {
    pub comments: Arc<dyn CommentRepo>,
    pub posts: PostCollection,
}

/// The complete application: API routes, CORS, request tracing and the non-API fallback.
///
/// With a `static_dir` every unknown path is served from the client bundle, falling back to its
/// `index.html` so client-side routes resolve. Without one unknown paths are a JSON 404.
pub fn app(state: ServerState, static_dir: Option<&Path>) -> Router {
    let router = routes::routes();
    let router = match static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router.fallback(fallback),
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] axum_extra::extract::QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Incoming form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] CommentValidationError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with slug {0:?} was not found.")]
    PostBySlugNotFound(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostBySlugNotFound(_)
            | ServerError::Database(DbError::CommentNotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::FormRejection(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_) | ServerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the client is told. Server-side failures keep their details in the log.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "Could not process the request at this time. Please try again later.".to_owned()
        } else {
            self.to_string()
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.public_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
