use crate::model::post::{InvalidPostMetaError, Post, PostMeta};
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Debug, Error)]
pub enum PostParseError {
    #[error("The file does not start with a `---` front-matter line")]
    MissingOpeningDelimiter,
    #[error("The front-matter is not closed by a `---` line")]
    MissingClosingDelimiter,
    #[error("The front-matter is not valid: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error(transparent)]
    Meta(#[from] InvalidPostMetaError),
}

/// Splits a post file into its front-matter block and its markdown body.
///
/// The first non-blank line must be `---`. The front-matter runs up to the next `---` line and
/// the body is everything after it, so horizontal rules in the body are left alone.
pub fn split_front_matter(text: &str) -> Result<(&str, &str), PostParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = Lines::new(text);

    let opening = lines
        .find(|line| !line.content.trim().is_empty())
        .filter(|line| is_delimiter(line.content))
        .ok_or(PostParseError::MissingOpeningDelimiter)?;

    let closing = lines
        .find(|line| is_delimiter(line.content))
        .ok_or(PostParseError::MissingClosingDelimiter)?;

    Ok((&text[opening.end..closing.start], &text[closing.end..]))
}

/// Parses a whole post file into a [`Post`].
pub fn parse_post(text: &str) -> Result<Post, PostParseError> {
    let (front_matter, body) = split_front_matter(text)?;
    let meta: PostMeta = serde_yaml::from_str(front_matter)?;

    Ok(Post::from_parts(meta, body.to_owned())?)
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

struct Line<'a> {
    content: &'a str,
    start: usize,
    /// Byte offset just past the line terminator.
    end: usize,
}

struct Lines<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let start = self.offset;
        let (content, len) = match rest.find('\n') {
            Some(newline) => (&rest[..newline], newline + 1),
            None => (rest, rest.len()),
        };
        self.offset += len;

        Some(Line {
            content,
            start,
            end: self.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "---
title: Hello world
date: 20200115
slug: hello-world
category: misc
tags:
  - rust
  - web
description: A first post
---
# Hello

Some text.
";

    #[test]
    fn parses_front_matter_and_body() {
        let post = parse_post(HELLO).unwrap();

        assert_eq!(post.title, "Hello world");
        assert_eq!(post.date, 2020_01_15);
        assert!(!post.draft);
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.category, "misc");
        assert_eq!(post.tags, ["rust", "web"]);
        assert_eq!(post.description, "A first post");
        assert_eq!(post.body, "# Hello\n\nSome text.\n");
    }

    #[test]
    fn optional_fields_default() {
        let post = parse_post("---\ntitle: T\ndate: 20210301\nslug: t\n---\nbody").unwrap();

        assert!(!post.draft);
        assert!(post.category.is_empty());
        assert!(post.tags.is_empty());
        assert!(post.description.is_empty());
        assert_eq!(post.body, "body");
    }

    #[test]
    fn body_keeps_horizontal_rules() {
        let text = "---\ntitle: T\ndate: 20210301\nslug: t\n---\nabove\n---\nbelow\n";

        assert_eq!(parse_post(text).unwrap().body, "above\n---\nbelow\n");
    }

    #[test]
    fn tolerates_crlf_bom_and_leading_blank_lines() {
        let text = "\u{feff}\r\n---\r\ntitle: T\r\ndate: 20210301\r\nslug: t\r\n---\r\nbody\r\n";
        let post = parse_post(text).unwrap();

        assert_eq!(post.slug, "t");
        assert_eq!(post.body, "body\r\n");
    }

    #[test]
    fn round_trips_through_markdown() {
        let mut post = parse_post(HELLO).unwrap();
        post.draft = true;
        post.description = "Quotes: \"yes\" and colons: here".to_owned();

        let reparsed = parse_post(&post.to_markdown().unwrap()).unwrap();

        assert_eq!(reparsed, post);
    }

    #[test]
    fn reports_missing_delimiters() {
        assert!(matches!(
            parse_post("title: T\n---\nbody"),
            Err(PostParseError::MissingOpeningDelimiter)
        ));
        assert!(matches!(
            parse_post(""),
            Err(PostParseError::MissingOpeningDelimiter)
        ));
        assert!(matches!(
            parse_post("---\ntitle: T\ndate: 20210301\nslug: t\n"),
            Err(PostParseError::MissingClosingDelimiter)
        ));
    }

    #[test]
    fn reports_malformed_front_matter() {
        assert!(matches!(
            parse_post("---\ntitle: [unclosed\n---\nbody"),
            Err(PostParseError::FrontMatter(_))
        ));
        assert!(matches!(
            parse_post("---\ntitle: No slug\ndate: 20210301\n---\nbody"),
            Err(PostParseError::FrontMatter(_))
        ));
        assert!(matches!(
            parse_post("---\ntitle: T\ndate: 20211301\nslug: t\n---\nbody"),
            Err(PostParseError::Meta(InvalidPostMetaError::Date(2021_13_01)))
        ));
    }
}
