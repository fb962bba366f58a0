//! Comment repository for cloudbox.

use super::{Comment, CommentWithAuthor, MAX_COMMENT_LENGTH};
use crate::db::DbPool;
use crate::file::FileRecord;
use crate::{CloudboxError, Result};

/// Repository for comment operations.
pub struct CommentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new CommentRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List comments on a file, newest first.
    pub async fn list_by_file(&self, file_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.file_id, c.author_id, u.username AS author_name, c.content, c.created_at
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.file_id = ?
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(file_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(comments)
    }

    /// Get a comment by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, file_id, author_id, content, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(comment)
    }

    /// Add a comment to a public file.
    pub async fn add(&self, file: &FileRecord, author_id: i64, content: &str) -> Result<Comment> {
        if !file.is_public {
            return Err(CloudboxError::Permission(
                "comments are only allowed on public files".to_string(),
            ));
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(CloudboxError::Validation(
                "comment must not be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(CloudboxError::Validation(format!(
                "comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (file_id, author_id, content) VALUES (?, ?, ?)
             RETURNING id, file_id, author_id, content, created_at",
        )
        .bind(file.id)
        .bind(author_id)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;

        tracing::info!(
            comment_id = comment.id,
            file_id = file.id,
            author_id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Delete a comment as `actor_id`.
    ///
    /// Returns false when the comment does not exist or the actor is neither
    /// its author nor an admin.
    pub async fn delete(&self, comment_id: i64, actor_id: i64, is_admin: bool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ? AND (author_id = ? OR ?)")
            .bind(comment_id)
            .bind(actor_id)
            .bind(is_admin)
            .execute(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all comments of a file. Returns the number removed.
    ///
    /// Takes any executor so purges can run it inside their transaction.
    pub async fn delete_by_file<'e, E>(executor: E, file_id: i64) -> Result<u64>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let result = sqlx::query("DELETE FROM comments WHERE file_id = ?")
            .bind(file_id)
            .execute(executor)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Count all comments.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }
}
