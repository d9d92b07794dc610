//! Post content read from markdown files with a YAML front-matter header.

mod collection;
mod parse;
mod store;

pub use collection::{PostCollection, PostQuery};
pub use parse::{PostParseError, parse_post, split_front_matter};
pub use store::{LoadedPosts, PostFileError, PostStoreError, load_posts};
