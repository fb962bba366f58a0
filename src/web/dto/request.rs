//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{legal_filename, not_empty_trimmed, single_line, verification_code};
use crate::comment::MAX_COMMENT_LENGTH;
use crate::file::{Category, MAX_DESCRIPTION_LENGTH};

// ============================================================================
// Auth
// ============================================================================

/// Request for a registration verification code.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendCodeRequest {
    /// Email to send the code to.
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Username the account will use.
    #[validate(custom(function = "single_line"))]
    pub username: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Code received by email.
    #[validate(custom(function = "verification_code"))]
    pub verification_code: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email or username.
    #[serde(alias = "username", alias = "email")]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub identifier: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================================================
// Profile
// ============================================================================

/// Username change request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeUsernameRequest {
    /// New username.
    pub new_username: String,
    /// Current password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    pub new_password: String,
    /// New password again.
    pub confirm_password: String,
}

// ============================================================================
// Files
// ============================================================================

/// Create a text file from the browser.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFileRequest {
    /// File name including extension.
    #[validate(custom(function = "legal_filename"))]
    pub filename: String,
    /// Text content.
    #[serde(default)]
    pub content: String,
    /// Store as a public file.
    #[serde(default)]
    pub is_public: bool,
    /// Optional description.
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    /// Category; inferred from the extension when absent.
    #[serde(default)]
    pub category: Option<Category>,
}

/// Rename request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameFileRequest {
    /// New file name.
    #[validate(custom(function = "legal_filename"))]
    pub new_name: String,
}

/// Category change request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveFileRequest {
    /// Target category.
    pub category: Category,
}

/// Visibility change request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    /// Whether the file should be public.
    pub is_public: bool,
}

// ============================================================================
// Comments
// ============================================================================

/// New comment.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Comment text.
    #[validate(
        custom(function = "not_empty_trimmed"),
        length(max = 1000, message = "Comment must not exceed 1000 characters")
    )]
    pub content: String,
}

// Keep the literal limits above in step with the domain constants.
const _: () = assert!(MAX_DESCRIPTION_LENGTH == 500 && MAX_COMMENT_LENGTH == 1000);
