//! Email verification code repository.
//!
//! Codes are one-time: a successful check deletes the row in the same
//! statement, so concurrent checks of one code cannot both succeed.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::datetime::to_db_string;
use crate::{CloudboxError, Result};

/// Stored verification code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    /// Row ID.
    pub id: i64,
    /// Email the code was sent to (lowercase).
    pub email: String,
    /// Six-digit code.
    pub code: String,
    /// Expiration timestamp.
    pub expires_at: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Repository for verification code operations.
pub struct VerificationCodeRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> VerificationCodeRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a code for an email, replacing any earlier code for that email.
    pub async fn replace(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode> {
        let email = email.trim().to_lowercase();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(&email)
            .execute(&mut *tx)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let record = sqlx::query_as::<_, VerificationCode>(
            "INSERT INTO verification_codes (email, code, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, email, code, expires_at, created_at",
        )
        .bind(&email)
        .bind(code)
        .bind(to_db_string(&expires_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(record)
    }

    /// Consume a matching, unexpired code.
    ///
    /// Returns true if a code was found and removed. Takes any executor so
    /// a transaction can put the code back if later work fails.
    pub async fn consume<'e, E>(
        executor: E,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let consumed: Option<i64> = sqlx::query_scalar(
            "DELETE FROM verification_codes
             WHERE email = $1 AND code = $2 AND expires_at > $3
             RETURNING id",
        )
        .bind(email.trim().to_lowercase())
        .bind(code.trim())
        .bind(to_db_string(&now))
        .fetch_optional(executor)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(consumed.is_some())
    }

    /// Delete codes that expired at or before `now`.
    ///
    /// Returns the number of deleted rows.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE expires_at <= $1")
            .bind(to_db_string(&now))
            .execute(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
