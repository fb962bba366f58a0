//! Physical file storage.
//!
//! Bytes live in two areas under one root:
//!
//! ```text
//! {root}/
//! ├── public_files/
//! │   └── 3f2a...c1.md            shared area for public files
//! └── user_files/
//!     ├── 1/
//!     │   └── 9b0e...77.txt       private files of user 1
//!     └── 2/
//! ```
//!
//! Stored names are `{uuid}.{ext}`, so concurrent writes never collide.
//! Paths recorded in the database are relative to the root and always use
//! `/` as separator.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::{CloudboxError, Result};

/// File storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    private_dir: String,
    public_dir: String,
}

impl FileStorage {
    /// Create a storage with the given root and area names.
    ///
    /// The root and both areas are created if missing.
    pub fn new(
        root: impl Into<PathBuf>,
        private_dir: impl Into<String>,
        public_dir: impl Into<String>,
    ) -> Result<Self> {
        let storage = Self {
            root: root.into(),
            private_dir: private_dir.into(),
            public_dir: public_dir.into(),
        };
        std::fs::create_dir_all(storage.root.join(&storage.private_dir))?;
        std::fs::create_dir_all(storage.root.join(&storage.public_dir))?;
        Ok(storage)
    }

    /// Create a storage from configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(&config.root, &config.private_dir, &config.public_dir)
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative directory for a user's private files.
    fn private_area(&self, owner_id: i64) -> String {
        format!("{}/{}", self.private_dir, owner_id)
    }

    /// Make sure a user's private directory exists.
    pub async fn ensure_user_dir(&self, owner_id: i64) -> Result<PathBuf> {
        let dir = self.absolute(&self.private_area(owner_id));
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Relative path for a stored name in the area matching `is_public`.
    pub fn relative_path(&self, owner_id: i64, is_public: bool, stored_name: &str) -> String {
        if is_public {
            format!("{}/{}", self.public_dir, stored_name)
        } else {
            format!("{}/{}", self.private_area(owner_id), stored_name)
        }
    }

    /// Resolve a relative path to an absolute one.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Generate a new UUID-based stored name keeping the original extension.
    pub fn generate_stored_name(original_name: &str) -> String {
        let ext = extension_of(original_name)
            .map(|e| e.trim_start_matches('.').to_string())
            .unwrap_or_else(|| "bin".to_string());
        format!("{}.{}", Uuid::new_v4(), ext)
    }

    /// Write a whole file at a relative path.
    pub async fn write(&self, relative: &str, content: &[u8]) -> Result<()> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(())
    }

    /// Read a whole file.
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>> {
        match fs::read(self.absolute(relative)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CloudboxError::NotFound("stored file".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file.
    ///
    /// Returns `false` if it did not exist.
    pub async fn remove(&self, relative: &str) -> Result<bool> {
        match fs::remove_file(self.absolute(relative)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file, logging instead of failing.
    pub async fn remove_quietly(&self, relative: &str) {
        match self.remove(relative).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(path = %relative, "Stored file already missing"),
            Err(e) => tracing::warn!(path = %relative, error = %e, "Failed to remove stored file"),
        }
    }

    /// Move a file between relative paths with a filesystem rename.
    pub async fn relocate(&self, from: &str, to: &str) -> Result<()> {
        let target = self.absolute(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        match fs::rename(self.absolute(from), &target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CloudboxError::NotFound("stored file".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of a stored file in bytes.
    pub async fn file_size(&self, relative: &str) -> Result<u64> {
        match fs::metadata(self.absolute(relative)).await {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CloudboxError::NotFound("stored file".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a stored file exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.absolute(relative).is_file()
    }
}

/// Lowercase extension including the dot, e.g. `.md`.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| format!(".{}", s.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), "user_files", "public_files").unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_new_creates_areas() {
        let (storage, _temp) = setup_storage();
        assert!(storage.root().join("user_files").is_dir());
        assert!(storage.root().join("public_files").is_dir());
    }

    #[test]
    fn test_relative_path() {
        let (storage, _temp) = setup_storage();
        assert_eq!(
            storage.relative_path(7, false, "a.txt"),
            "user_files/7/a.txt"
        );
        assert_eq!(storage.relative_path(7, true, "a.txt"), "public_files/a.txt");
    }

    #[test]
    fn test_absolute_ignores_traversal() {
        let (storage, _temp) = setup_storage();
        let path = storage.absolute("../../etc/passwd");
        assert!(path.starts_with(storage.root()));
    }

    #[test]
    fn test_generate_stored_name() {
        let name = FileStorage::generate_stored_name("Report.MD");
        assert!(name.ends_with(".md"));
        assert_eq!(name.len(), 36 + 3);

        let name = FileStorage::generate_stored_name("Makefile");
        assert!(name.ends_with(".bin"));

        assert_ne!(
            FileStorage::generate_stored_name("a.txt"),
            FileStorage::generate_stored_name("a.txt")
        );
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT").as_deref(), Some(".txt"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let (storage, _temp) = setup_storage();
        let rel = storage.relative_path(1, false, "x.txt");

        storage.write(&rel, b"hello").await.unwrap();
        assert!(storage.exists(&rel));
        assert_eq!(storage.read(&rel).await.unwrap(), b"hello");
        assert_eq!(storage.file_size(&rel).await.unwrap(), 5);

        assert!(storage.remove(&rel).await.unwrap());
        assert!(!storage.remove(&rel).await.unwrap());
        assert!(matches!(
            storage.read(&rel).await,
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_relocate() {
        let (storage, _temp) = setup_storage();
        let private = storage.relative_path(1, false, "x.txt");
        let public = storage.relative_path(1, true, "x.txt");

        storage.write(&private, b"data").await.unwrap();
        storage.relocate(&private, &public).await.unwrap();

        assert!(!storage.exists(&private));
        assert_eq!(storage.read(&public).await.unwrap(), b"data");
        assert!(matches!(
            storage.relocate(&private, &public).await,
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_user_dir() {
        let (storage, _temp) = setup_storage();
        let dir = storage.ensure_user_dir(42).await.unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("user_files/42"));
    }
}
