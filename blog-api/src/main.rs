use blog_common::content::{PostCollection, PostStoreError, load_posts};
use blog_db::{
    client::{DbClient, DbError},
    memory::MemoryCommentRepo,
    repo::CommentRepo,
};
use config::Env;
use server::ServerState;
use sqlx::postgres::PgPoolOptions;
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error loading posts: {0}")]
    PostStore(#[from] PostStoreError),
    #[error("Post loading task failed: {0}")]
    PostLoadTask(#[from] JoinError),
    #[error("Error connecting to the database: {0}")]
    DatabaseConnect(sqlx::Error),
    #[error("Error preparing the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "blog_api=debug,\
                blog_common=debug,\
                blog_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn load_post_collection(posts_dir: PathBuf) -> Result<PostCollection, InitError> {
    let loaded = tokio::task::spawn_blocking(move || load_posts(posts_dir)).await??;

    Ok(loaded.posts)
}

async fn comment_repo(env: &Env) -> Result<Arc<dyn CommentRepo>, InitError> {
    let Some(database_url) = env.database_url.as_deref() else {
        warn!("DATABASE_URL not set, comments are kept in memory only");
        return Ok(Arc::new(MemoryCommentRepo::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .acquire_timeout(env.database_acquire_timeout())
        .connect(database_url)
        .await
        .map_err(InitError::DatabaseConnect)?;

    let client = DbClient::new(pool);
    client.migrate().await?;
    info!("Connected to the comment database");

    Ok(Arc::new(client))
}

async fn watch_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutting down");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = config::get_env()?;

    // Nothing is served until every post file has been read.
    let posts = load_post_collection(env.posts_dir.clone()).await?;
    let comments = comment_repo(&env).await?;

    let app = server::app(ServerState { comments, posts }, env.static_dir());

    let server_address = env.socket_address();
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, dev_mode = env.dev_mode, "Blog server is listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
