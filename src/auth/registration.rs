//! User registration with email verification.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{
    validate_email, validate_password_confirmation, validate_username, ValidationError,
};
use crate::auth::verification::VerificationService;
use crate::auth::{hash_password, validate_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::CloudboxError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Password rejected or could not be hashed.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Username already exists.
    #[error("username is already taken")]
    UsernameExists,

    /// Email already registered.
    #[error("email is already registered")]
    EmailExists,

    /// Verification code missing, wrong, expired or already used.
    #[error("invalid or expired verification code")]
    InvalidCode,

    /// Underlying storage failure.
    #[error("database error: {0}")]
    Database(String),
}

impl From<CloudboxError> for RegistrationError {
    fn from(e: CloudboxError) -> Self {
        match e {
            CloudboxError::Conflict(msg) if msg.contains("email") => RegistrationError::EmailExists,
            CloudboxError::Conflict(_) => RegistrationError::UsernameExists,
            other => RegistrationError::Database(other.to_string()),
        }
    }
}

impl From<RegistrationError> for CloudboxError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Validation(v) => v.into(),
            RegistrationError::Password(p) => p.into(),
            RegistrationError::UsernameExists | RegistrationError::EmailExists => {
                CloudboxError::Conflict(e.to_string())
            }
            RegistrationError::InvalidCode => CloudboxError::Validation(e.to_string()),
            RegistrationError::Database(msg) => CloudboxError::Database(msg),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (3-30 letters, digits, underscore).
    pub username: String,
    /// Email address the code was sent to.
    pub email: String,
    /// Password (6-128 characters).
    pub password: String,
    /// Password repeated.
    pub confirm_password: String,
    /// Verification code received by email.
    pub code: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    ///
    /// The confirmation defaults to the password itself.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            confirm_password: password.clone(),
            password,
            code: code.into(),
        }
    }

    /// Set the password confirmation.
    pub fn with_confirmation(mut self, confirm: impl Into<String>) -> Self {
        self.confirm_password = confirm.into();
        self
    }
}

/// Validate a username/email pair and make sure neither is registered.
///
/// Used before a verification code is sent and again at registration.
pub async fn ensure_available(
    repo: &UserRepository<'_>,
    username: &str,
    email: &str,
) -> Result<(), RegistrationError> {
    validate_username(username)?;
    validate_email(email)?;

    if repo.email_exists(email).await? {
        return Err(RegistrationError::EmailExists);
    }
    if repo.username_exists(username).await? {
        return Err(RegistrationError::UsernameExists);
    }
    Ok(())
}

/// Register a new user.
///
/// Steps:
/// 1. Validate every field and the password confirmation
/// 2. Reject duplicate username or email
/// 3. Hash the password
/// 4. Consume the code and create the verified, non-admin user in one
///    transaction
///
/// A request rejected at any step leaves the code usable, including a
/// duplicate that only shows up when the row is inserted.
pub async fn register(
    repo: &UserRepository<'_>,
    verification: &VerificationService<'_>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    validate_password(&request.password)?;
    validate_password_confirmation(&request.password, &request.confirm_password)?;
    ensure_available(repo, &request.username, &request.email).await?;

    let password_hash = hash_password(&request.password)?;
    let new_user =
        NewUser::new(&request.username, &request.email, password_hash).with_verified(true);
    let user = redeem_and_create(repo, verification, &new_user, &request.code).await?;

    info!(
        username = %user.username,
        user_id = user.id,
        "New user registered"
    );

    Ok(user)
}

/// Consume the code for `new_user.email` and insert the user atomically.
async fn redeem_and_create(
    repo: &UserRepository<'_>,
    verification: &VerificationService<'_>,
    new_user: &NewUser,
    code: &str,
) -> Result<User, RegistrationError> {
    let mut tx = repo.begin().await?;

    if !verification
        .verify_in(&mut tx, &new_user.email, code)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?
    {
        return Err(RegistrationError::InvalidCode);
    }

    // Dropping the transaction on a conflict puts the code back.
    let id = UserRepository::insert(&mut *tx, new_user).await?;
    tx.commit()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    repo.get_by_id(id)
        .await?
        .ok_or_else(|| RegistrationError::Database("registered user vanished".to_string()))
}
