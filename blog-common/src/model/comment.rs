use crate::model::Id;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;
use time::OffsetDateTime;

pub const COMMENT_NAME_MAX_LEN: usize = 255;
pub const COMMENT_POST_MAX_LEN: usize = 255;
pub const COMMENT_TEXT_MIN_LEN: usize = 20;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// A stored comment, in the shape of its table row.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub name: String,
    pub text: String,
    /// Slug of the post the comment belongs to.
    pub post: String,
    pub parent_comment_id: Option<Id<CommentMarker>>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub moderated: bool,
}

/// The author-supplied part of a comment, already validated.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CommentContent {
    pub name: String,
    pub text: String,
    pub post: String,
    pub parent_comment_id: Option<Id<CommentMarker>>,
}

/// A full replacement of a comment's mutable columns.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CommentUpdate {
    pub content: CommentContent,
    pub moderated: bool,
}

/// A comment as submitted by a client, before validation.
///
/// Decoding never fails on `parentCommentId` or `moderated`: values that cannot be read as a
/// positive id or as `true` fall back to `None` and `false`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub post: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub parent_comment_id: Option<Id<CommentMarker>>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub moderated: bool,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum CommentViolation {
    MissingName,
    NameTooLong,
    MissingText,
    TextTooShort,
    MissingPost,
    PostTooLong,
    /// The named field holds a U+0000 character, which PostgreSQL text columns reject.
    NulCharacter(&'static str),
}

impl Display for CommentViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("name is required"),
            Self::NameTooLong => write!(f, "name must be at most {COMMENT_NAME_MAX_LEN} characters"),
            Self::MissingText => f.write_str("text is required"),
            Self::TextTooShort => {
                write!(f, "text must be at least {COMMENT_TEXT_MIN_LEN} characters")
            }
            Self::MissingPost => f.write_str("post is required"),
            Self::PostTooLong => write!(f, "post must be at most {COMMENT_POST_MAX_LEN} characters"),
            Self::NulCharacter(field) => write!(f, "{field} must not contain NUL characters"),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("Invalid comment: {}", join_violations(.0))]
pub struct CommentValidationError(pub Vec<CommentViolation>);

fn join_violations(violations: &[CommentViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CommentForm {
    /// Checks every field and reports all violations at once.
    pub fn into_content(self) -> Result<CommentContent, CommentValidationError> {
        let mut violations = Vec::new();

        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            violations.push(CommentViolation::MissingName);
        } else if name.chars().count() > COMMENT_NAME_MAX_LEN {
            violations.push(CommentViolation::NameTooLong);
        }

        let text = self.text.unwrap_or_default();
        let text_len = text.trim().chars().count();
        if text_len == 0 {
            violations.push(CommentViolation::MissingText);
        } else if text_len < COMMENT_TEXT_MIN_LEN {
            violations.push(CommentViolation::TextTooShort);
        }

        let post = self.post.unwrap_or_default();
        if post.trim().is_empty() {
            violations.push(CommentViolation::MissingPost);
        } else if post.chars().count() > COMMENT_POST_MAX_LEN {
            violations.push(CommentViolation::PostTooLong);
        }

        for (field, value) in [("name", &name), ("text", &text), ("post", &post)] {
            if value.contains('\0') {
                violations.push(CommentViolation::NulCharacter(field));
            }
        }

        if !violations.is_empty() {
            return Err(CommentValidationError(violations));
        }

        Ok(CommentContent {
            name,
            text,
            post,
            parent_comment_id: self.parent_comment_id,
        })
    }

    pub fn into_update(self) -> Result<CommentUpdate, CommentValidationError> {
        let moderated = self.moderated;
        let content = self.into_content()?;

        Ok(CommentUpdate { content, moderated })
    }
}

/// Any JSON or form value, for fields that must never fail to decode.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<Id<CommentMarker>>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match LooseValue::deserialize(deserializer)? {
        LooseValue::Int(id) => Some(id),
        LooseValue::Float(id) if id.fract() == 0.0 && id.abs() < 9.0e15 => Some(id as i64),
        LooseValue::Text(text) => text.trim().parse().ok(),
        LooseValue::Bool(_) | LooseValue::Float(_) | LooseValue::Other(_) => None,
    };

    Ok(id.filter(|id| *id > 0).map(Id::new))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Bool(flag) => flag,
        LooseValue::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        LooseValue::Int(_) | LooseValue::Float(_) | LooseValue::Other(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> CommentForm {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "name": "Alice",
            "text": "Great post, thanks so much!",
            "post": "my-slug",
        })
    }

    #[test]
    fn accepts_a_complete_comment() {
        let content = form(valid()).into_content().unwrap();

        assert_eq!(content.name, "Alice");
        assert_eq!(content.text, "Great post, thanks so much!");
        assert_eq!(content.post, "my-slug");
        assert_eq!(content.parent_comment_id, None);
    }

    #[test]
    fn reports_every_violation() {
        let err = form(json!({ "name": "  ", "text": "too short" }))
            .into_content()
            .unwrap_err();

        assert_eq!(
            err.0,
            vec![
                CommentViolation::MissingName,
                CommentViolation::TextTooShort,
                CommentViolation::MissingPost,
            ]
        );
        assert_eq!(
            err.to_string(),
            "Invalid comment: name is required, text must be at least 20 characters, \
             post is required"
        );
    }

    #[test]
    fn limits_name_length_in_characters() {
        let mut value = valid();
        value["name"] = json!("\u{e9}".repeat(COMMENT_NAME_MAX_LEN));
        assert!(form(value.clone()).into_content().is_ok());

        value["name"] = json!("a".repeat(COMMENT_NAME_MAX_LEN + 1));
        assert_eq!(
            form(value).into_content().unwrap_err().0,
            vec![CommentViolation::NameTooLong]
        );
    }

    #[test]
    fn rejects_nul_characters_in_every_field() {
        let value = json!({
            "name": "Al\u{0}ice",
            "text": "Great post,\u{0} thanks so much!",
            "post": "my-\u{0}slug",
        });

        let err = form(value).into_content().unwrap_err();

        assert_eq!(
            err.0,
            vec![
                CommentViolation::NulCharacter("name"),
                CommentViolation::NulCharacter("text"),
                CommentViolation::NulCharacter("post"),
            ]
        );
        assert_eq!(err.0[0].to_string(), "name must not contain NUL characters");
    }

    #[test]
    fn text_length_ignores_surrounding_whitespace() {
        let mut value = valid();
        value["text"] = json!(format!("   {}   ", "x".repeat(COMMENT_TEXT_MIN_LEN - 1)));

        assert_eq!(
            form(value).into_content().unwrap_err().0,
            vec![CommentViolation::TextTooShort]
        );
    }

    #[test]
    fn parent_comment_id_never_fails_to_decode() {
        let cases = [
            (json!(7), Some(7)),
            (json!("12"), Some(12)),
            (json!(" 3 "), Some(3)),
            (json!(4.0), Some(4)),
            (json!(4.5), None),
            (json!("abc"), None),
            (json!(""), None),
            (json!(0), None),
            (json!(-2), None),
            (json!(null), None),
            (json!(true), None),
            (json!({ "id": 1 }), None),
            (json!([1]), None),
        ];

        for (raw, expected) in cases {
            let mut value = valid();
            value["parentCommentId"] = raw.clone();
            assert_eq!(
                form(value).parent_comment_id,
                expected.map(Id::new),
                "parentCommentId = {raw}"
            );
        }

        assert_eq!(form(valid()).parent_comment_id, None);
    }

    #[test]
    fn moderated_is_true_only_for_true_or_the_string_true() {
        let cases = [
            (json!(true), true),
            (json!("true"), true),
            (json!("TRUE "), true),
            (json!(false), false),
            (json!("false"), false),
            (json!("yes"), false),
            (json!(1), false),
            (json!(null), false),
        ];

        for (raw, expected) in cases {
            let mut value = valid();
            value["moderated"] = raw.clone();
            let update = form(value).into_update().unwrap();
            assert_eq!(update.moderated, expected, "moderated = {raw}");
        }

        assert!(!form(valid()).into_update().unwrap().moderated);
    }

    #[test]
    fn serializes_in_row_shape() {
        let comment = Comment {
            id: Id::new(1),
            name: "Alice".to_owned(),
            text: "Great post, thanks so much!".to_owned(),
            post: "my-slug".to_owned(),
            parent_comment_id: None,
            date: time::macros::datetime!(2020-01-15 10:30 UTC),
            moderated: false,
        };

        assert_eq!(
            serde_json::to_value(&comment).unwrap(),
            json!({
                "id": 1,
                "name": "Alice",
                "text": "Great post, thanks so much!",
                "post": "my-slug",
                "parent_comment_id": null,
                "date": "2020-01-15T10:30:00Z",
                "moderated": false,
            })
        );
    }
}
