//! User repository for cloudbox.

use sqlx::{QueryBuilder, Sqlite, Transaction};

use super::user::{NewUser, User, UserUpdate};
use super::DbPool;
use crate::{CloudboxError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, is_admin, is_verified, created_at, updated_at";

/// Map a UNIQUE violation to a conflict, anything else to a database error.
fn map_unique_violation(e: sqlx::Error) -> CloudboxError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") {
        if msg.contains("users.email") {
            CloudboxError::Conflict("email is already registered".to_string())
        } else {
            CloudboxError::Conflict("username is already taken".to_string())
        }
    } else {
        CloudboxError::Database(msg)
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Duplicate usernames or emails (case-insensitive) yield
    /// [`CloudboxError::Conflict`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id = Self::insert(self.pool, new_user).await?;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("user".to_string()))
    }

    /// Insert a user row through any executor and return its ID.
    ///
    /// Same conflict mapping as [`create`](Self::create).
    pub async fn insert<'e, E>(executor: E, new_user: &NewUser) -> Result<i64>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, is_admin, is_verified)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.is_admin)
        .bind(new_user.is_verified)
        .execute(executor)
        .await
        .map_err(map_unique_violation)?;

        Ok(result.last_insert_rowid())
    }

    /// Start a transaction on the repository's pool.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Get a user by email or username, as accepted on the login form.
    pub async fn get_by_email_or_username(&self, identifier: &str) -> Result<Option<User>> {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            self.get_by_email(identifier).await
        } else {
            self.get_by_username(identifier).await
        }
    }

    /// Check whether a username is taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Check whether an email is registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update are modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref username) = update.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        if let Some(is_verified) = update.is_verified {
            separated.push("is_verified = ");
            separated.push_bind_unseparated(is_verified);
        }
        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a user by ID.
    ///
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users, oldest first.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(users)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "hash");
        assert!(!user.is_admin);
        assert_eq!(user.role(), "member");
    }

    #[tokio::test]
    async fn test_duplicate_username_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let result = repo
            .create(&NewUser::new("ALICE", "other@example.com", "hash"))
            .await;

        match result {
            Err(CloudboxError::Conflict(msg)) => assert!(msg.contains("username")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let result = repo
            .create(&NewUser::new("bob", "Alice@Example.com", "hash"))
            .await;

        match result {
            Err(CloudboxError::Conflict(msg)) => assert!(msg.contains("email")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookups() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let created = repo
            .create(&NewUser::new("Alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap().id, created.id);
        assert!(repo.get_by_username("alice").await.unwrap().is_some());
        assert!(repo.get_by_email("ALICE@example.com").await.unwrap().is_some());
        assert!(repo
            .get_by_email_or_username("alice@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_by_email_or_username("ALICE")
            .await
            .unwrap()
            .is_some());
        assert!(repo.get_by_email_or_username("bob").await.unwrap().is_none());
        assert!(repo.username_exists("aLiCe").await.unwrap());
        assert!(!repo.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        let updated = repo
            .update(user.id, &UserUpdate::new().username("alice2").password("hash2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.password, "hash2");

        assert!(repo
            .update(9999, &UserUpdate::new().username("ghost"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_username_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let bob = repo
            .create(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        let result = repo
            .update(bob.id, &UserUpdate::new().username("Alice"))
            .await;
        assert!(matches!(result, Err(CloudboxError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        repo.create(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
