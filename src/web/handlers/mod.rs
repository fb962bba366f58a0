//! API handlers.

pub mod admin;
pub mod auth;
pub mod comment;
pub mod file;
pub mod profile;
pub mod trash;

pub use admin::*;
pub use auth::*;
pub use comment::*;
pub use file::*;
pub use profile::*;
pub use trash::*;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::auth::{VerificationService, DEFAULT_CODE_TTL_SECS};
use crate::db::{DbPool, User, UserRepository};
use crate::file::{FileService, FileStorage, UploadPolicy, DEFAULT_RETENTION_DAYS};
use crate::mail::Mailer;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;
use crate::{Config, Database, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Physical file storage.
    pub storage: FileStorage,
    /// Quota and extension rules.
    pub policy: UploadPolicy,
    /// Verification mail backend.
    pub mailer: Mailer,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Verification code lifetime in seconds.
    pub code_ttl_secs: i64,
    /// Days a trashed file is kept.
    pub retention_days: i64,
}

impl AppState {
    /// Create a new application state with default code and trash lifetimes.
    pub fn new(
        db: Database,
        storage: FileStorage,
        policy: UploadPolicy,
        mailer: Mailer,
        jwt_secret: &str,
        access_expiry: u64,
    ) -> Self {
        Self {
            db,
            storage,
            policy,
            mailer,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry: access_expiry,
            code_ttl_secs: DEFAULT_CODE_TTL_SECS,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    /// Build the state from configuration.
    ///
    /// Creates the storage directories and the mail client.
    pub fn from_config(db: Database, config: &Config) -> Result<Self> {
        let storage = FileStorage::from_config(&config.storage)?;
        let policy = UploadPolicy::from_config(&config.storage);
        let mailer = Mailer::from_config(&config.mail)?;

        Ok(Self::new(
            db,
            storage,
            policy,
            mailer,
            &config.server.jwt_secret,
            config.server.jwt_access_token_expiry_secs,
        )
        .with_code_ttl(config.verification.code_ttl_secs)
        .with_retention_days(config.trash.retention_days))
    }

    /// Set the verification code lifetime.
    pub fn with_code_ttl(mut self, secs: i64) -> Self {
        self.code_ttl_secs = secs;
        self
    }

    /// Set the trash retention.
    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &DbPool {
        self.db.pool()
    }

    /// User repository over the shared pool.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self.pool())
    }

    /// Verification code service.
    pub fn verification(&self) -> VerificationService<'_> {
        VerificationService::new(self.pool(), self.code_ttl_secs)
    }

    /// File service over the shared storage.
    pub fn files(&self) -> FileService<'_> {
        FileService::new(
            self.pool(),
            &self.storage,
            &self.policy,
            self.retention_days,
        )
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> std::result::Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
