//! Comments on public files.
//!
//! Comments can only be added to public files. A comment can be removed by
//! its author or an administrator; anyone else gets a plain `false`.

mod repository;

pub use repository::CommentRepository;

/// Maximum length for comment content (in characters).
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// A stored comment.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID.
    pub id: i64,
    /// File the comment belongs to.
    pub file_id: i64,
    /// Author user ID.
    pub author_id: i64,
    /// Comment text, trimmed.
    pub content: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A comment together with its author's current username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub file_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

impl CommentWithAuthor {
    /// Check whether `user_id` may delete this comment.
    pub fn can_delete(&self, user_id: i64, is_admin: bool) -> bool {
        is_admin || self.author_id == user_id
    }
}
