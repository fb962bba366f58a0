//! Start-up creation of the administrator account.

use tracing::{debug, info};

use crate::auth::hash_password;
use crate::config::AdminConfig;
use crate::db::{NewUser, User, UserRepository};
use crate::Result;

/// Make sure the configured administrator exists.
///
/// The admin is identified by email: if a user with that email exists,
/// nothing changes. Otherwise a verified admin is created with the
/// configured username and password. Returns the user when one was created.
pub async fn ensure_admin(repo: &UserRepository<'_>, config: &AdminConfig) -> Result<Option<User>> {
    if repo.email_exists(&config.email).await? {
        debug!(email = %config.email, "Administrator account already present");
        return Ok(None);
    }

    let hash = hash_password(&config.password)?;
    let admin = repo
        .create(
            &NewUser::new(&config.username, &config.email, hash)
                .with_admin(true)
                .with_verified(true),
        )
        .await?;

    info!(
        username = %admin.username,
        user_id = admin.id,
        "Administrator account created"
    );
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::Database;

    #[tokio::test]
    async fn test_ensure_admin_creates_once() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let config = AdminConfig::default();

        let created = ensure_admin(&repo, &config).await.unwrap().unwrap();
        assert!(created.is_admin);
        assert!(created.is_verified);
        assert_eq!(created.username, "admin");
        assert!(verify_password("admin123", &created.password).is_ok());

        assert!(ensure_admin(&repo, &config).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_admin_detects_by_email() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());
        let config = AdminConfig::default();
        ensure_admin(&repo, &config).await.unwrap();

        // A renamed admin is still recognised by its email.
        let renamed = AdminConfig {
            username: "superuser".to_string(),
            ..AdminConfig::default()
        };
        assert!(ensure_admin(&repo, &renamed).await.unwrap().is_none());
    }
}
