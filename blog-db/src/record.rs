use blog_common::model::comment::Comment;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, sqlx::FromRow)]
pub(crate) struct CommentRecord {
    pub id: i64,
    pub name: String,
    pub post: String,
    pub text: String,
    pub parent_comment_id: Option<i64>,
    pub date: OffsetDateTime,
    pub moderated: bool,
}

impl From<CommentRecord> for Comment {
    fn from(value: CommentRecord) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            text: value.text,
            post: value.post,
            parent_comment_id: value.parent_comment_id.map(Into::into),
            date: value.date,
            moderated: value.moderated,
        }
    }
}
