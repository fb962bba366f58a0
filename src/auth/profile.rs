//! Account self-service: viewing the profile, changing username and password.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_password_confirmation, validate_username, ValidationError};
use crate::auth::{hash_password, validate_password, verify_password, PasswordError};
use crate::db::{User, UserRepository, UserUpdate};
use crate::CloudboxError;

/// Profile-related errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Validation failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Password rejected.
    #[error("{0}")]
    Password(#[from] PasswordError),

    /// Current password is incorrect.
    #[error("current password is incorrect")]
    WrongPassword,

    /// New password equals the current one.
    #[error("new password must differ from the current password")]
    SamePassword,

    /// New username equals the current one.
    #[error("new username must differ from the current username")]
    SameUsername,

    /// Username belongs to another user.
    #[error("username is already taken")]
    UsernameTaken,

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<ProfileError> for CloudboxError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::UserNotFound => CloudboxError::NotFound("user".to_string()),
            ProfileError::UsernameTaken => CloudboxError::Conflict(e.to_string()),
            ProfileError::Database(msg) => CloudboxError::Database(msg),
            ProfileError::Password(PasswordError::HashError(msg)) => CloudboxError::Database(msg),
            _ => CloudboxError::Validation(e.to_string()),
        }
    }
}

/// User profile for display, without the password hash.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Administrator flag.
    pub is_admin: bool,
    /// Account creation date.
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

async fn load_user(repo: &UserRepository<'_>, user_id: i64) -> Result<User, ProfileError> {
    repo.get_by_id(user_id)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .ok_or(ProfileError::UserNotFound)
}

fn check_current_password(password: &str, user: &User) -> Result<(), ProfileError> {
    verify_password(password, &user.password).map_err(|e| match e {
        PasswordError::VerificationFailed => ProfileError::WrongPassword,
        other => ProfileError::Password(other),
    })
}

/// Get a user's profile.
pub async fn get_profile(
    repo: &UserRepository<'_>,
    user_id: i64,
) -> Result<UserProfile, ProfileError> {
    Ok(load_user(repo, user_id).await?.into())
}

/// Change the username after re-checking the current password.
pub async fn change_username(
    repo: &UserRepository<'_>,
    user_id: i64,
    new_username: &str,
    password: &str,
) -> Result<User, ProfileError> {
    let new_username = new_username.trim();
    validate_username(new_username)?;

    let user = load_user(repo, user_id).await?;
    check_current_password(password, &user)?;

    if user.username == new_username {
        return Err(ProfileError::SameUsername);
    }

    let taken = repo
        .get_by_username(new_username)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .is_some_and(|other| other.id != user.id);
    if taken {
        return Err(ProfileError::UsernameTaken);
    }

    let updated = repo
        .update(user.id, &UserUpdate::new().username(new_username))
        .await
        .map_err(|e| match e {
            CloudboxError::Conflict(_) => ProfileError::UsernameTaken,
            other => ProfileError::Database(other.to_string()),
        })?
        .ok_or(ProfileError::UserNotFound)?;

    info!(
        user_id = updated.id,
        old = %user.username,
        new = %updated.username,
        "Username changed"
    );
    Ok(updated)
}

/// Change the password after re-checking the current one.
pub async fn change_password(
    repo: &UserRepository<'_>,
    user_id: i64,
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), ProfileError> {
    validate_password(new_password)?;
    validate_password_confirmation(new_password, confirm_password)?;
    if current_password == new_password {
        return Err(ProfileError::SamePassword);
    }

    let user = load_user(repo, user_id).await?;
    check_current_password(current_password, &user)?;

    let hash = hash_password(new_password)?;
    repo.update(user.id, &UserUpdate::new().password(hash))
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?
        .ok_or(ProfileError::UserNotFound)?;

    info!(user_id = user.id, "Password changed");
    Ok(())
}
