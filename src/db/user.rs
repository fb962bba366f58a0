//! User model for cloudbox.

/// Registered user account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (unique, stored lowercase).
    pub email: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Whether the user is an administrator.
    pub is_admin: bool,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
}

impl User {
    /// Role name carried in access tokens.
    pub fn role(&self) -> &'static str {
        if self.is_admin {
            "admin"
        } else {
            "member"
        }
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash (must be pre-hashed with Argon2).
    pub password: String,
    /// Administrator flag (defaults to false).
    pub is_admin: bool,
    /// Verified flag (defaults to false).
    pub is_verified: bool,
}

impl NewUser {
    /// Create a new user with the required fields.
    ///
    /// The email is normalized to lowercase.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into().trim().to_lowercase(),
            password: password.into(),
            is_admin: false,
            is_verified: false,
        }
    }

    /// Mark the user as administrator.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Mark the email as verified.
    pub fn with_verified(mut self, is_verified: bool) -> Self {
        self.is_verified = is_verified;
        self
    }
}

/// Data for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New username.
    pub username: Option<String>,
    /// New password hash.
    pub password: Option<String>,
    /// New verified flag.
    pub is_verified: Option<bool>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set a new password hash.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the verified flag.
    pub fn is_verified(mut self, is_verified: bool) -> Self {
        self.is_verified = Some(is_verified);
        self
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.is_verified.is_none()
    }
}
