use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A blog post, parsed from a markdown file with a YAML front-matter header.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Post {
    pub title: String,
    /// Publication date as `YYYYMMDD`.
    pub date: u32,
    pub draft: bool,
    pub slug: String,
    pub category: String,
    pub tags: Vec<String>,
    pub description: String,
    pub body: String,
}

/// The front-matter header of a post file.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostMeta {
    pub title: String,
    pub date: u32,
    #[serde(default)]
    pub draft: bool,
    pub slug: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum InvalidPostMetaError {
    #[error("The slug {0:?} is not URL-safe")]
    Slug(String),
    #[error("The date {0} is not a YYYYMMDD date")]
    Date(u32),
}

impl Post {
    pub fn from_parts(meta: PostMeta, body: String) -> Result<Self, InvalidPostMetaError> {
        if !is_url_safe_slug(&meta.slug) {
            return Err(InvalidPostMetaError::Slug(meta.slug));
        }
        if !is_yyyymmdd(meta.date) {
            return Err(InvalidPostMetaError::Date(meta.date));
        }

        Ok(Self {
            title: meta.title,
            date: meta.date,
            draft: meta.draft,
            slug: meta.slug,
            category: meta.category,
            tags: meta.tags,
            description: meta.description,
            body,
        })
    }

    #[must_use]
    pub fn meta(&self) -> PostMeta {
        PostMeta {
            title: self.title.clone(),
            date: self.date,
            draft: self.draft,
            slug: self.slug.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            description: self.description.clone(),
        }
    }

    /// Renders the post back into the file format it is loaded from.
    pub fn to_markdown(&self) -> Result<String, serde_yaml::Error> {
        let front_matter = serde_yaml::to_string(&self.meta())?;

        Ok(format!("---\n{front_matter}---\n{}", self.body))
    }

    #[must_use]
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_yyyymmdd(date: u32) -> bool {
    let month = date / 100 % 100;
    let day = date % 100;

    (1000_01_01..=9999_12_31).contains(&date)
        && (1..=12).contains(&month)
        && (1..=31).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> PostMeta {
        PostMeta {
            title: "Hello".to_owned(),
            date: 2020_01_15,
            draft: false,
            slug: "hello-world".to_owned(),
            category: "misc".to_owned(),
            tags: vec!["rust".to_owned()],
            description: String::new(),
        }
    }

    #[test]
    fn from_parts_keeps_every_field() {
        let post = Post::from_parts(meta(), "# Hi\n".to_owned()).unwrap();

        assert_eq!(post.meta(), meta());
        assert_eq!(post.body, "# Hi\n");
    }

    #[test]
    fn rejects_slugs_that_need_escaping() {
        for slug in ["", "with space", "a/b", "caf\u{e9}"] {
            let meta = PostMeta {
                slug: slug.to_owned(),
                ..meta()
            };
            assert_eq!(
                Post::from_parts(meta, String::new()),
                Err(InvalidPostMetaError::Slug(slug.to_owned()))
            );
        }
    }

    #[test]
    fn rejects_dates_outside_yyyymmdd() {
        for date in [0, 2020_13_01, 2020_00_10, 2020_01_32, 2020_01_00, 999_12_31] {
            let meta = PostMeta { date, ..meta() };
            assert_eq!(
                Post::from_parts(meta, String::new()),
                Err(InvalidPostMetaError::Date(date))
            );
        }
    }

    #[test]
    fn matches_any_of_the_given_tags() {
        let post = Post::from_parts(meta(), String::new()).unwrap();

        assert!(post.has_any_tag(&["go".to_owned(), "rust".to_owned()]));
        assert!(!post.has_any_tag(&["go".to_owned()]));
        assert!(!post.has_any_tag(&[]));
    }
}
