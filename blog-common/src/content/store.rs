use crate::{
    content::{
        collection::PostCollection,
        parse::{PostParseError, parse_post},
    },
    model::post::Post,
};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PostStoreError {
    #[error("Unable to scan post directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },
}

/// A post file that was left out of the collection.
#[derive(Debug, Error)]
pub enum PostFileError {
    #[error("Unable to read post file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Unable to parse post file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: PostParseError,
    },
    #[error(
        "Post file {} reuses slug {slug:?} of {}",
        path.display(),
        first.display()
    )]
    DuplicateSlug {
        path: PathBuf,
        slug: String,
        first: PathBuf,
    },
}

impl PostFileError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::DuplicateSlug { path, .. } => {
                path
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadedPosts {
    pub posts: PostCollection,
    pub skipped: Vec<PostFileError>,
}

/// Loads every post file in `directory`, in file name order.
///
/// Only an unreadable directory fails the load. Files that cannot be read or parsed, and files
/// reusing a slug, are logged and reported in [`LoadedPosts::skipped`].
pub fn load_posts(directory: impl AsRef<Path>) -> Result<LoadedPosts, PostStoreError> {
    let directory = directory.as_ref();
    let read_dir_error = |source| PostStoreError::ReadDir {
        path: directory.to_owned(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if is_post_file(&path) {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "Ignoring non-post directory entry");
        }
    }
    paths.sort();

    let mut posts = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();
    let mut slugs: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        match read_post(&path) {
            Ok(post) => {
                if let Some(first) = slugs.get(&post.slug) {
                    skipped.push(PostFileError::DuplicateSlug {
                        slug: post.slug,
                        first: first.clone(),
                        path,
                    });
                    continue;
                }
                slugs.insert(post.slug.clone(), path);
                posts.push(post);
            }
            Err(err) => skipped.push(err),
        }
    }

    for err in &skipped {
        warn!(error = %err, "Skipping post file");
    }
    info!(
        directory = %directory.display(),
        loaded = posts.len(),
        skipped = skipped.len(),
        "Loaded posts"
    );

    Ok(LoadedPosts {
        posts: PostCollection::new(posts),
        skipped,
    })
}

fn is_post_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_none_or(|name| name.starts_with('.'));

    !hidden && path.is_file()
}

fn read_post(path: &Path) -> Result<Post, PostFileError> {
    let text = fs::read_to_string(path).map_err(|source| PostFileError::Read {
        path: path.to_owned(),
        source,
    })?;

    parse_post(&text).map_err(|source| PostFileError::Parse {
        path: path.to_owned(),
        source,
    })
}
