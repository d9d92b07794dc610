use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::{
    extract::{Query, WithRejection},
    routing::{RouterExt, TypedPath},
};
use blog_common::{
    content::{PostCollection, PostQuery},
    model::post::Post,
};
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_get(list_tags)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts", rejection(ServerError))]
struct PostsPath();

#[derive(Deserialize)]
struct PostsParams {
    /// Repeated keys and comma-separated values both add tags.
    #[serde(default)]
    tags: Vec<String>,
    q: Option<String>,
}

impl From<PostsParams> for PostQuery {
    fn from(params: PostsParams) -> Self {
        let tags = params
            .tags
            .iter()
            .flat_map(|tags| tags.split(','))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect();

        Self { tags, q: params.q }
    }
}

async fn list_posts(
    PostsPath(): PostsPath,
    State(posts): State<PostCollection>,
    WithRejection(Query(params), _): WithRejection<Query<PostsParams>, ServerError>,
) -> Result<Json<PostCollection>> {
    let query = PostQuery::from(params);
    if query.is_empty() {
        return Ok(Json(posts));
    }

    let matching = posts.search(&query).into_iter().cloned().collect();
    Ok(Json(PostCollection::new(matching)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{slug}", rejection(ServerError))]
struct PostPath {
    slug: String,
}

async fn get_post(
    PostPath { slug }: PostPath,
    State(posts): State<PostCollection>,
) -> Result<Json<Post>> {
    let post = posts
        .find(&slug)
        .cloned()
        .ok_or(ServerError::PostBySlugNotFound(slug))?;

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/tags", rejection(ServerError))]
struct TagsPath();

async fn list_tags(TagsPath(): TagsPath, State(posts): State<PostCollection>) -> Json<Vec<String>> {
    Json(posts.tags().into_iter().map(str::to_owned).collect())
}
