//! Recycle bin.
//!
//! Trashing moves a row from `files` into `trash` inside one transaction;
//! the bytes on disk stay where they are until the entry is purged. Purging
//! operations here only touch the database and hand the removed entries
//! back so the caller can unlink their bytes.

use chrono::{DateTime, Duration, Utc};

use crate::comment::CommentRepository;
use crate::datetime::to_db_string;
use crate::db::DbPool;
use crate::file::metadata::{Category, FileRecord, FILE_COLUMNS};
use crate::{CloudboxError, Result};

/// Default number of days a trashed file is kept.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// A file sitting in the recycle bin.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrashEntry {
    /// Trash entry ID.
    pub id: i64,
    /// ID the file had while live; reused on restore.
    pub file_id: i64,
    pub owner_id: i64,
    pub stored_name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub is_public: bool,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    /// When the file was trashed.
    pub deleted_at: String,
    /// When the entry becomes eligible for purge.
    pub expire_at: String,
}

const TRASH_COLUMNS: &str = "id, file_id, owner_id, stored_name, original_name, path, size, \
     mime_type, category, is_public, description, created_at, updated_at, deleted_at, expire_at";

/// Repository for recycle bin entries.
pub struct TrashRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TrashRepository<'a> {
    /// Create a new TrashRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Move a live file into the trash.
    ///
    /// Returns None if the file does not exist (or was trashed concurrently).
    pub async fn move_to_trash(
        &self,
        file_id: i64,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<Option<TrashEntry>> {
        let deleted_at = to_db_string(&now);
        let expire_at = to_db_string(&(now + Duration::days(retention_days)));

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let sql = format!(
            "INSERT INTO trash (file_id, owner_id, stored_name, original_name, path, size, \
             mime_type, category, is_public, description, created_at, updated_at, deleted_at, \
             expire_at) \
             SELECT id, owner_id, stored_name, original_name, path, size, mime_type, category, \
             is_public, description, created_at, updated_at, ?, ? FROM files WHERE id = ? \
             RETURNING {TRASH_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, TrashEntry>(&sql)
            .bind(&deleted_at)
            .bind(&expire_at)
            .bind(file_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(Some(entry))
    }

    /// Get a trash entry by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<TrashEntry>> {
        let sql = format!("SELECT {TRASH_COLUMNS} FROM trash WHERE id = ?");
        let entry = sqlx::query_as::<_, TrashEntry>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(entry)
    }

    /// List a user's trash, most recently deleted first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<TrashEntry>> {
        let sql = format!(
            "SELECT {TRASH_COLUMNS} FROM trash WHERE owner_id = ? ORDER BY deleted_at DESC, id DESC"
        );
        let entries = sqlx::query_as::<_, TrashEntry>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(entries)
    }

    /// List every trash entry.
    pub async fn list_all(&self) -> Result<Vec<TrashEntry>> {
        let sql = format!("SELECT {TRASH_COLUMNS} FROM trash ORDER BY deleted_at DESC, id DESC");
        let entries = sqlx::query_as::<_, TrashEntry>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(entries)
    }

    /// Count all trash entries.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trash")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count a user's trash entries.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trash WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Put a trashed file back under its original ID.
    ///
    /// Returns None if the entry does not exist.
    pub async fn restore(&self, id: i64) -> Result<Option<FileRecord>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let sql = format!(
            "INSERT INTO files (id, owner_id, stored_name, original_name, path, size, mime_type, \
             category, is_public, description, created_at, updated_at) \
             SELECT file_id, owner_id, stored_name, original_name, path, size, mime_type, \
             category, is_public, description, created_at, updated_at FROM trash WHERE id = ? \
             RETURNING {FILE_COLUMNS}"
        );
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let Some(file) = file else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM trash WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(Some(file))
    }

    /// Remove one entry and the comments of its file.
    ///
    /// Returns the removed entry, or None if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<Option<TrashEntry>> {
        Ok(self.purge(Purge::One(id)).await?.pop())
    }

    /// Remove every entry with `expire_at <= now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<TrashEntry>> {
        self.purge(Purge::ExpiredAt(to_db_string(&now))).await
    }

    /// Remove every entry of one user.
    pub async fn delete_by_owner(&self, owner_id: i64) -> Result<Vec<TrashEntry>> {
        self.purge(Purge::Owner(owner_id)).await
    }

    async fn purge(&self, which: Purge) -> Result<Vec<TrashEntry>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        let query = match &which {
            Purge::One(id) => {
                let sql = format!("DELETE FROM trash WHERE id = ? RETURNING {TRASH_COLUMNS}");
                sqlx::query_as::<_, TrashEntry>(&sql)
                    .bind(*id)
                    .fetch_all(&mut *tx)
                    .await
            }
            Purge::ExpiredAt(now) => {
                let sql =
                    format!("DELETE FROM trash WHERE expire_at <= ? RETURNING {TRASH_COLUMNS}");
                sqlx::query_as::<_, TrashEntry>(&sql)
                    .bind(now)
                    .fetch_all(&mut *tx)
                    .await
            }
            Purge::Owner(owner_id) => {
                let sql = format!("DELETE FROM trash WHERE owner_id = ? RETURNING {TRASH_COLUMNS}");
                sqlx::query_as::<_, TrashEntry>(&sql)
                    .bind(*owner_id)
                    .fetch_all(&mut *tx)
                    .await
            }
        };
        let entries = query.map_err(|e| CloudboxError::Database(e.to_string()))?;

        for entry in &entries {
            CommentRepository::delete_by_file(&mut *tx, entry.file_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(entries)
    }
}

/// Selection of trash entries to purge.
enum Purge {
    One(i64),
    ExpiredAt(String),
    Owner(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_db_string;
    use crate::db::{NewUser, UserRepository};
    use crate::file::{FileRepository, NewFile};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    async fn create_file(db: &Database, owner_id: i64, name: &str) -> FileRecord {
        FileRepository::new(db.pool())
            .create(
                &NewFile::new(
                    owner_id,
                    format!("{name}.bin"),
                    name,
                    format!("user_files/{owner_id}/{name}.bin"),
                    42,
                    "text/plain",
                )
                .with_category(Category::Memo)
                .with_description("notes"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_move_to_trash() {
        let (db, owner) = setup().await;
        let file = create_file(&db, owner, "a.txt").await;
        let trash = TrashRepository::new(db.pool());
        let now = Utc::now();

        let entry = trash
            .move_to_trash(file.id, now, DEFAULT_RETENTION_DAYS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.file_id, file.id);
        assert_eq!(entry.original_name, "a.txt");

        let deleted = parse_db_string(&entry.deleted_at).unwrap();
        let expires = parse_db_string(&entry.expire_at).unwrap();
        assert_eq!(expires - deleted, Duration::days(30));

        let files = FileRepository::new(db.pool());
        assert!(files.get_by_id(file.id).await.unwrap().is_none());
        assert_eq!(trash.list_by_owner(owner).await.unwrap().len(), 1);

        // Second trash of the same file finds nothing.
        assert!(trash
            .move_to_trash(file.id, now, DEFAULT_RETENTION_DAYS)
            .await
            .unwrap()
            .is_none());
        assert_eq!(trash.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_restore_preserves_fields() {
        let (db, owner) = setup().await;
        let file = create_file(&db, owner, "a.txt").await;
        let trash = TrashRepository::new(db.pool());
        let entry = trash
            .move_to_trash(file.id, Utc::now(), DEFAULT_RETENTION_DAYS)
            .await
            .unwrap()
            .unwrap();

        let restored = trash.restore(entry.id).await.unwrap().unwrap();
        assert_eq!(restored.id, file.id);
        assert_eq!(restored.original_name, file.original_name);
        assert_eq!(restored.path, file.path);
        assert_eq!(restored.size, file.size);
        assert_eq!(restored.category, file.category);
        assert_eq!(restored.description, file.description);
        assert_eq!(restored.created_at, file.created_at);

        assert_eq!(trash.count().await.unwrap(), 0);
        assert!(trash.restore(entry.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_comments() {
        let (db, owner) = setup().await;
        let file = create_file(&db, owner, "a.txt").await;
        sqlx::query("INSERT INTO comments (file_id, author_id, content) VALUES (?, ?, 'hi')")
            .bind(file.id)
            .bind(owner)
            .execute(db.pool())
            .await
            .unwrap();

        let trash = TrashRepository::new(db.pool());
        let entry = trash
            .move_to_trash(file.id, Utc::now(), DEFAULT_RETENTION_DAYS)
            .await
            .unwrap()
            .unwrap();

        let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(comments, 1);

        let removed = trash.delete(entry.id).await.unwrap().unwrap();
        assert_eq!(removed.id, entry.id);
        assert!(trash.delete(entry.id).await.unwrap().is_none());

        let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(comments, 0);
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (db, owner) = setup().await;
        let old = create_file(&db, owner, "old.txt").await;
        let fresh = create_file(&db, owner, "fresh.txt").await;
        let trash = TrashRepository::new(db.pool());
        let now = Utc::now();

        trash
            .move_to_trash(old.id, now - Duration::days(31), DEFAULT_RETENTION_DAYS)
            .await
            .unwrap();
        trash
            .move_to_trash(fresh.id, now, DEFAULT_RETENTION_DAYS)
            .await
            .unwrap();

        let purged = trash.delete_expired(now).await.unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].file_id, old.id);
        assert_eq!(trash.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let (db, owner) = setup().await;
        let a = create_file(&db, owner, "a.txt").await;
        let b = create_file(&db, owner, "b.txt").await;
        let trash = TrashRepository::new(db.pool());
        for id in [a.id, b.id] {
            trash
                .move_to_trash(id, Utc::now(), DEFAULT_RETENTION_DAYS)
                .await
                .unwrap();
        }

        assert_eq!(trash.count_by_owner(owner).await.unwrap(), 2);
        assert_eq!(trash.delete_by_owner(owner).await.unwrap().len(), 2);
        assert_eq!(trash.count_by_owner(owner).await.unwrap(), 0);
    }
}
