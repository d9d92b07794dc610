use crate::model::post::Post;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// The posts loaded at startup, in load order. Cheap to clone and never mutated.
#[derive(Clone, Debug, Default)]
pub struct PostCollection(Arc<[Post]>);

/// Narrows a post listing the way the sidebar search does.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostQuery {
    /// A post matches when it carries any of these tags. Empty matches everything.
    pub tags: Vec<String>,
    /// Case-insensitive substring of the title.
    pub q: Option<String>,
}

impl PostCollection {
    #[must_use]
    pub fn new(posts: Vec<Post>) -> Self {
        Self(posts.into())
    }

    #[must_use]
    pub fn all(&self) -> &[Post] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.0.iter().find(|post| post.slug == slug)
    }

    /// Every distinct tag, in the order it first appears.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.0.iter().flat_map(|post| &post.tags) {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }

    #[must_use]
    pub fn search(&self, query: &PostQuery) -> Vec<&Post> {
        self.0.iter().filter(|post| query.matches(post)).collect()
    }
}

impl Serialize for PostCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl PostQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.q.as_deref().is_none_or(str::is_empty)
    }

    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        if !self.tags.is_empty() && !post.has_any_tag(&self.tags) {
            return false;
        }

        match self.q.as_deref() {
            Some(q) if !q.is_empty() => post.title.to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, title: &str, tags: &[&str]) -> Post {
        Post {
            title: title.to_owned(),
            date: 2020_01_01,
            slug: slug.to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            ..Post::default()
        }
    }

    fn collection() -> PostCollection {
        PostCollection::new(vec![
            post("axum", "Routing with Axum", &["rust", "web"]),
            post("sqlx", "Compile-time SQL", &["rust", "db"]),
            post("css", "Grid layouts", &["web"]),
        ])
    }

    fn slugs(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|post| post.slug.clone()).collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let posts = collection();
        let query = PostQuery::default();

        assert!(query.is_empty());
        assert_eq!(slugs(&posts.search(&query)), ["axum", "sqlx", "css"]);
    }

    #[test]
    fn tags_match_any() {
        let query = PostQuery {
            tags: vec!["db".to_owned(), "web".to_owned()],
            q: None,
        };

        assert_eq!(slugs(&collection().search(&query)), ["axum", "sqlx", "css"]);

        let query = PostQuery {
            tags: vec!["db".to_owned()],
            q: None,
        };
        assert_eq!(slugs(&collection().search(&query)), ["sqlx"]);
    }

    #[test]
    fn title_search_is_case_insensitive_and_literal() {
        let query = PostQuery {
            tags: Vec::new(),
            q: Some("AXUM".to_owned()),
        };
        assert_eq!(slugs(&collection().search(&query)), ["axum"]);

        let query = PostQuery {
            tags: Vec::new(),
            q: Some("G.id".to_owned()),
        };
        assert!(collection().search(&query).is_empty());
    }

    #[test]
    fn tags_and_title_combine() {
        let query = PostQuery {
            tags: vec!["web".to_owned()],
            q: Some("grid".to_owned()),
        };

        assert_eq!(slugs(&collection().search(&query)), ["css"]);
    }

    #[test]
    fn lists_distinct_tags_in_first_seen_order() {
        assert_eq!(collection().tags(), ["rust", "web", "db"]);
    }

    #[test]
    fn finds_by_slug() {
        let posts = collection();

        assert_eq!(posts.find("sqlx").map(|post| post.title.as_str()), Some("Compile-time SQL"));
        assert!(posts.find("missing").is_none());
    }
}
