//! Email verification codes.
//!
//! A code is six decimal digits, lives for a fixed TTL (ten minutes by
//! default) and is valid for exactly one successful check. Expiry is
//! enforced when the code is checked, independently of the background
//! sweep.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::db::{DbPool, VerificationCodeRepository};
use crate::Result;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// Default code lifetime in seconds.
pub const DEFAULT_CODE_TTL_SECS: i64 = 600;

/// Generate a six-digit code, uniform over `000000..=999999`.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:0width$}", n, width = CODE_LENGTH)
}

async fn check<'e, E>(executor: E, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    if code.trim().len() != CODE_LENGTH {
        return Ok(false);
    }
    VerificationCodeRepository::consume(executor, email, code, now).await
}

/// Issues and checks verification codes.
pub struct VerificationService<'a> {
    pool: &'a DbPool,
    ttl: Duration,
}

impl<'a> VerificationService<'a> {
    /// Create a service with the given code lifetime.
    pub fn new(pool: &'a DbPool, ttl_secs: i64) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a fresh code for an email, replacing any earlier one.
    pub async fn issue(&self, email: &str) -> Result<String> {
        self.issue_at(email, Utc::now()).await
    }

    /// Issue a code as if the current time were `now`.
    pub async fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<String> {
        let code = generate_code();
        VerificationCodeRepository::new(self.pool)
            .replace(email, &code, now + self.ttl)
            .await?;
        debug!(email = %email, "Verification code issued");
        Ok(code)
    }

    /// Check and consume a code.
    pub async fn verify(&self, email: &str, code: &str) -> Result<bool> {
        self.verify_at(email, code, Utc::now()).await
    }

    /// Check and consume a code as if the current time were `now`.
    pub async fn verify_at(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<bool> {
        check(self.pool, email, code, now).await
    }

    /// Check and consume a code inside the caller's transaction.
    pub async fn verify_in(
        &self,
        conn: &mut SqliteConnection,
        email: &str,
        code: &str,
    ) -> Result<bool> {
        check(conn, email, code, Utc::now()).await
    }

    /// Remove expired codes. Returns the number removed.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        VerificationCodeRepository::new(self.pool)
            .cleanup_expired(Utc::now())
            .await
    }
}
