//! File metadata types and repository.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::file::storage::extension_of;
use crate::{CloudboxError, Result};

/// Display category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Source code.
    Code,
    /// Notes and documents.
    Memo,
    /// Pictures.
    Image,
    /// Anything else.
    #[default]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 4] = [
        Category::Code,
        Category::Memo,
        Category::Image,
        Category::Other,
    ];

    /// Database string for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Code => "code",
            Category::Memo => "memo",
            Category::Image => "image",
            Category::Other => "other",
        }
    }

    /// Icon name shown next to files of this category.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Code => "bi-code-slash",
            Category::Memo => "bi-journal-text",
            Category::Image => "bi-image",
            Category::Other => "bi-folder",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Code => "Code",
            Category::Memo => "Memo",
            Category::Image => "Image",
            Category::Other => "Other",
        }
    }

    /// Infer a category from a filename's extension.
    pub fn from_filename(filename: &str) -> Self {
        extension_of(filename)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or_default()
    }

    /// Infer a category from an extension such as `.py` or `py`.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "cpp" | "py" | "js" | "html" | "css" | "json" | "xml" | "java" | "c" | "h" | "cs" => {
                Category::Code
            }
            "txt" | "md" => Category::Memo,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => Category::Image,
            _ => Category::Other,
        }
    }

    /// Parse a database or request string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Some(Category::Code),
            "memo" => Some(Category::Memo),
            "image" => Some(Category::Image),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Category::parse(&value).ok_or_else(|| format!("unknown category: {value}"))
    }
}

/// A live file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user ID.
    pub owner_id: i64,
    /// Server-generated name on disk.
    pub stored_name: String,
    /// Name supplied by the user.
    pub original_name: String,
    /// Path relative to the storage root.
    pub path: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Display category.
    #[sqlx(try_from = "String")]
    pub category: Category,
    /// Whether anyone may read the file.
    pub is_public: bool,
    /// Free text description.
    pub description: String,
    /// Upload time.
    pub created_at: String,
    /// Last metadata change.
    pub updated_at: String,
}

impl FileRecord {
    /// Size in bytes, never negative.
    pub fn size_bytes(&self) -> u64 {
        self.size.max(0) as u64
    }

    /// Check whether this is an image.
    pub fn is_image(&self) -> bool {
        self.category == Category::Image || self.mime_type.starts_with("image/")
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: i64,
    pub stored_name: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    pub category: Category,
    pub is_public: bool,
    pub description: String,
}

impl NewFile {
    /// Create a new private file record in the `Other` category.
    pub fn new(
        owner_id: i64,
        stored_name: impl Into<String>,
        original_name: impl Into<String>,
        path: impl Into<String>,
        size: i64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            stored_name: stored_name.into(),
            original_name: original_name.into(),
            path: path.into(),
            size,
            mime_type: mime_type.into(),
            category: Category::Other,
            is_public: false,
            description: String::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub(crate) const FILE_COLUMNS: &str = "id, owner_id, stored_name, original_name, path, size, \
     mime_type, category, is_public, description, created_at, updated_at";

/// Repository for file metadata.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new file record.
    pub async fn create(&self, new_file: &NewFile) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (owner_id, stored_name, original_name, path, size, mime_type, \
             category, is_public, description) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {FILE_COLUMNS}"
        );
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(new_file.owner_id)
            .bind(&new_file.stored_name)
            .bind(&new_file.original_name)
            .bind(&new_file.path)
            .bind(new_file.size)
            .bind(&new_file.mime_type)
            .bind(new_file.category.as_str())
            .bind(new_file.is_public)
            .bind(&new_file.description)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(file)
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(file)
    }

    /// List a user's files, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ? ORDER BY created_at DESC, id DESC"
        );
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(files)
    }

    /// List public files, newest first.
    pub async fn list_public(&self) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE is_public = 1 ORDER BY created_at DESC, id DESC"
        );
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(files)
    }

    /// List every file, newest first.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files ORDER BY created_at DESC, id DESC");
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(files)
    }

    /// Count all files.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count public files.
    pub async fn count_public(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE is_public = 1")
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count a user's files per category. Every category is present.
    pub async fn count_by_category(&self, owner_id: i64) -> Result<Vec<(Category, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM files WHERE owner_id = ? GROUP BY category",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CloudboxError::Database(e.to_string()))?;

        Ok(Category::ALL
            .iter()
            .map(|category| {
                let count = rows
                    .iter()
                    .filter(|(name, _)| Category::parse(name) == Some(*category))
                    .map(|(_, n)| *n)
                    .sum();
                (*category, count)
            })
            .collect())
    }

    /// Total bytes used by a user's live files.
    pub async fn storage_used(&self, owner_id: i64) -> Result<u64> {
        let used: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM files WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(used.max(0) as u64)
    }

    /// Count files owned by a user.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Change the user-facing name.
    pub async fn rename(&self, id: i64, original_name: &str) -> Result<Option<FileRecord>> {
        self.update_columns(id, |query| {
            query.push("original_name = ").push_bind(original_name.to_string());
        })
        .await
    }

    /// Change the category.
    pub async fn set_category(&self, id: i64, category: Category) -> Result<Option<FileRecord>> {
        self.update_columns(id, |query| {
            query.push("category = ").push_bind(category.as_str());
        })
        .await
    }

    /// Change visibility together with the new on-disk path.
    pub async fn set_visibility(
        &self,
        id: i64,
        is_public: bool,
        path: &str,
    ) -> Result<Option<FileRecord>> {
        self.update_columns(id, |query| {
            query
                .push("is_public = ")
                .push_bind(is_public)
                .push(", path = ")
                .push_bind(path.to_string());
        })
        .await
    }

    async fn update_columns<F>(&self, id: i64, set: F) -> Result<Option<FileRecord>>
    where
        F: FnOnce(&mut QueryBuilder<'_, sqlx::Sqlite>),
    {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE files SET ");
        set(&mut query);
        query.push(", updated_at = datetime('now') WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a file record, returning it.
    pub async fn delete(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("DELETE FROM files WHERE id = ? RETURNING {FILE_COLUMNS}");
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| CloudboxError::Database(e.to_string()))?;
        Ok(file)
    }
}
