use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

const DEV_PORT: u16 = 3001;
const PRODUCTION_PORT: u16 = 80;

/// Process configuration, read from the environment and an optional `.env` file.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    /// Serve on the development port and leave static files to the client dev server.
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default = "default_server_address")]
    pub server_address: IpAddr,
    pub server_port: Option<u16>,
    /// Without a database URL comments are kept in memory.
    pub database_url: Option<String>,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_database_acquire_timeout_secs")]
    pub database_acquire_timeout_secs: u64,
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_server_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_database_max_connections() -> u32 {
    10
}

fn default_database_acquire_timeout_secs() -> u64 {
    30
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("posts")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("blog-front-end/build")
}

impl Env {
    #[must_use]
    pub fn socket_address(&self) -> SocketAddr {
        let default_port = if self.dev_mode {
            DEV_PORT
        } else {
            PRODUCTION_PORT
        };

        SocketAddr::new(self.server_address, self.server_port.unwrap_or(default_port))
    }

    /// The client bundle to fall back to for non-API paths, if it is served by this process.
    #[must_use]
    pub fn static_dir(&self) -> Option<&Path> {
        (!self.dev_mode).then_some(self.static_dir.as_path())
    }

    #[must_use]
    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }
}

pub fn get_env() -> Result<Env, crate::InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .env file found");
        } else {
            return Err(e.into());
        }
    }

    Ok(envy::from_env()?)
}
