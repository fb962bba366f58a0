//! File service for cloudbox.
//!
//! This module ties metadata, storage, upload rules and the recycle bin
//! together:
//! - Upload and in-browser creation with quota and extension checks
//! - Viewing and downloading with access control
//! - Rename, category change and visibility change
//! - Trash, restore, permanent delete and expiry

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::auth::{check_file_access, check_trash_access, Actor, FileAction};
use crate::db::DbPool;
use crate::{CloudboxError, Result};

use super::metadata::{Category, FileRecord, FileRepository, NewFile};
use super::policy::{validate_filename, UploadPolicy};
use super::reader::{is_image, read_content, FileContent};
use super::storage::FileStorage;
use super::trash::{TrashEntry, TrashRepository};
use super::MAX_DESCRIPTION_LENGTH;

/// Request data for a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Name supplied by the client.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
    /// Store in the public area.
    pub is_public: bool,
    /// Optional description.
    pub description: Option<String>,
    /// Category; inferred from the extension when absent.
    pub category: Option<Category>,
}

impl UploadRequest {
    /// Create a new private upload request.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
            is_public: false,
            description: None,
            category: None,
        }
    }

    /// Set visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// Request data for creating a text file from the browser.
#[derive(Debug, Clone)]
pub struct CreateTextRequest {
    pub filename: String,
    pub content: String,
    pub is_public: bool,
    pub description: Option<String>,
    pub category: Option<Category>,
}

impl From<CreateTextRequest> for UploadRequest {
    fn from(request: CreateTextRequest) -> Self {
        Self {
            filename: request.filename,
            content: request.content.into_bytes(),
            is_public: request.is_public,
            description: request.description,
            category: request.category,
        }
    }
}

/// Storage usage of one user.
#[derive(Debug, Clone)]
pub struct StorageUsage {
    /// Bytes used by live files.
    pub used: u64,
    /// Quota in bytes.
    pub quota: u64,
    /// Number of live files.
    pub file_count: i64,
    /// Number of files per category.
    pub by_category: Vec<(Category, i64)>,
}

impl StorageUsage {
    /// Used share of the quota in percent, capped at 100.
    pub fn percent(&self) -> f64 {
        if self.quota == 0 {
            return 100.0;
        }
        (self.used as f64 / self.quota as f64 * 100.0).min(100.0)
    }
}

/// File service for managing uploads, downloads and the recycle bin.
pub struct FileService<'a> {
    pool: &'a DbPool,
    storage: &'a FileStorage,
    policy: &'a UploadPolicy,
    retention_days: i64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(
        pool: &'a DbPool,
        storage: &'a FileStorage,
        policy: &'a UploadPolicy,
        retention_days: i64,
    ) -> Self {
        Self {
            pool,
            storage,
            policy,
            retention_days,
        }
    }

    fn files(&self) -> FileRepository<'a> {
        FileRepository::new(self.pool)
    }

    fn trash_repo(&self) -> TrashRepository<'a> {
        TrashRepository::new(self.pool)
    }

    /// Store a new file for `owner_id`.
    ///
    /// The extension is checked before anything is written. The quota is
    /// checked against the size actually written; a rejected or failed
    /// upload leaves neither bytes nor metadata behind.
    pub async fn upload(&self, owner_id: i64, request: UploadRequest) -> Result<FileRecord> {
        let original_name = validate_filename(&request.filename)?.to_string();
        let description = request.description.unwrap_or_default().trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(CloudboxError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        self.policy.check_extension(&original_name)?;

        let stored_name = FileStorage::generate_stored_name(&original_name);
        let path = self
            .storage
            .relative_path(owner_id, request.is_public, &stored_name);
        let category = request
            .category
            .unwrap_or_else(|| Category::from_filename(&original_name));
        let record: Result<FileRecord> = async {
            self.storage.write(&path, &request.content).await?;
            let new_file = self
                .record_upload(owner_id, &original_name, &stored_name, &path, request.is_public)
                .await?
                .with_description(description)
                .with_category(category);
            self.files().create(&new_file).await
        }
        .await;

        match record {
            Ok(file) => {
                info!(
                    file_id = file.id,
                    owner_id,
                    size = file.size,
                    is_public = file.is_public,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(e) => {
                self.storage.remove_quietly(&path).await;
                Err(e)
            }
        }
    }

    /// Check the quota for bytes already on disk and build the record.
    async fn record_upload(
        &self,
        owner_id: i64,
        original_name: &str,
        stored_name: &str,
        path: &str,
        is_public: bool,
    ) -> Result<NewFile> {
        let size = self.storage.file_size(path).await?;
        let used = self.files().storage_used(owner_id).await?;
        if let Err(e) = self.policy.check_quota(used, size) {
            warn!(owner_id, used, incoming = size, "Upload rejected by quota");
            return Err(e);
        }

        let mime_type = mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .to_string();
        Ok(NewFile::new(
            owner_id,
            stored_name,
            original_name,
            path,
            size as i64,
            mime_type,
        )
        .with_public(is_public))
    }

    /// Create a file from text typed in the browser.
    pub async fn create_text(
        &self,
        owner_id: i64,
        request: CreateTextRequest,
    ) -> Result<FileRecord> {
        self.upload(owner_id, request.into()).await
    }

    async fn load(&self, id: i64) -> Result<FileRecord> {
        self.files()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("file".to_string()))
    }

    /// Get file metadata.
    pub async fn get(&self, id: i64, actor: &Actor) -> Result<FileRecord> {
        let file = self.load(id).await?;
        check_file_access(&file, actor, FileAction::Read)?;
        Ok(file)
    }

    /// Get file metadata and its viewable content.
    pub async fn view(&self, id: i64, actor: &Actor) -> Result<(FileRecord, FileContent)> {
        let file = self.get(id, actor).await?;
        let content = if is_image(&file.original_name) {
            read_content(&file.original_name, &[])
        } else {
            let bytes = self.storage.read(&file.path).await?;
            read_content(&file.original_name, &bytes)
        };
        Ok((file, content))
    }

    /// Get file metadata and its bytes.
    pub async fn download(&self, id: i64, actor: &Actor) -> Result<(FileRecord, Vec<u8>)> {
        let file = self.get(id, actor).await?;
        let bytes = self.storage.read(&file.path).await?;
        debug!(file_id = file.id, size = bytes.len(), "File downloaded");
        Ok((file, bytes))
    }

    /// List a user's live files.
    pub async fn list_own(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        self.files().list_by_owner(owner_id).await
    }

    /// List public files.
    pub async fn list_public(&self) -> Result<Vec<FileRecord>> {
        self.files().list_public().await
    }

    /// Change the display name of a file.
    pub async fn rename(&self, id: i64, actor: &Actor, new_name: &str) -> Result<FileRecord> {
        let new_name = validate_filename(new_name)?;
        let file = self.load(id).await?;
        check_file_access(&file, actor, FileAction::Mutate)?;

        let updated = self
            .files()
            .rename(file.id, new_name)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("file".to_string()))?;
        info!(file_id = file.id, old = %file.original_name, new = %updated.original_name, "File renamed");
        Ok(updated)
    }

    /// Move a file to another category.
    pub async fn move_to_category(
        &self,
        id: i64,
        actor: &Actor,
        category: Category,
    ) -> Result<FileRecord> {
        let file = self.load(id).await?;
        check_file_access(&file, actor, FileAction::Mutate)?;

        self.files()
            .set_category(file.id, category)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("file".to_string()))
    }

    /// Make a file public or private, relocating its bytes.
    pub async fn set_visibility(
        &self,
        id: i64,
        actor: &Actor,
        is_public: bool,
    ) -> Result<FileRecord> {
        let file = self.load(id).await?;
        check_file_access(&file, actor, FileAction::Mutate)?;
        if file.is_public == is_public {
            return Ok(file);
        }

        let new_path = self
            .storage
            .relative_path(file.owner_id, is_public, &file.stored_name);
        self.storage.relocate(&file.path, &new_path).await?;

        match self.files().set_visibility(file.id, is_public, &new_path).await {
            Ok(Some(updated)) => {
                info!(file_id = file.id, is_public, "File visibility changed");
                Ok(updated)
            }
            result => {
                if let Err(e) = self.storage.relocate(&new_path, &file.path).await {
                    warn!(file_id = file.id, error = %e, "Failed to move file back after visibility change failed");
                }
                match result {
                    Err(e) => Err(e),
                    _ => Err(CloudboxError::NotFound("file".to_string())),
                }
            }
        }
    }

    /// Move a file to the recycle bin.
    pub async fn trash(&self, id: i64, actor: &Actor) -> Result<TrashEntry> {
        self.trash_at(id, actor, Utc::now()).await
    }

    /// Move a file to the recycle bin at a given time.
    pub async fn trash_at(&self, id: i64, actor: &Actor, now: DateTime<Utc>) -> Result<TrashEntry> {
        let file = self.load(id).await?;
        check_file_access(&file, actor, FileAction::Mutate)?;

        let entry = self
            .trash_repo()
            .move_to_trash(file.id, now, self.retention_days)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("file".to_string()))?;
        info!(file_id = file.id, trash_id = entry.id, "File moved to trash");
        Ok(entry)
    }

    /// List the actor's own trash.
    pub async fn list_trash(&self, owner_id: i64) -> Result<Vec<TrashEntry>> {
        self.trash_repo().list_by_owner(owner_id).await
    }

    async fn load_trash(&self, trash_id: i64, actor: &Actor) -> Result<TrashEntry> {
        let entry = self
            .trash_repo()
            .get_by_id(trash_id)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("trash entry".to_string()))?;
        check_trash_access(entry.owner_id, actor)?;
        Ok(entry)
    }

    /// Put a trashed file back.
    pub async fn restore(&self, trash_id: i64, actor: &Actor) -> Result<FileRecord> {
        let entry = self.load_trash(trash_id, actor).await?;
        let file = self
            .trash_repo()
            .restore(entry.id)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("trash entry".to_string()))?;
        info!(file_id = file.id, trash_id, "File restored from trash");
        Ok(file)
    }

    /// Delete a trashed file for good.
    pub async fn permanent_delete(&self, trash_id: i64, actor: &Actor) -> Result<()> {
        let entry = self.load_trash(trash_id, actor).await?;
        let removed = self
            .trash_repo()
            .delete(entry.id)
            .await?
            .ok_or_else(|| CloudboxError::NotFound("trash entry".to_string()))?;
        self.storage.remove_quietly(&removed.path).await;
        info!(file_id = removed.file_id, trash_id, "File permanently deleted");
        Ok(())
    }

    /// Delete every trashed file of a user. Returns the number removed.
    pub async fn empty_trash(&self, owner_id: i64) -> Result<u64> {
        let removed = self.trash_repo().delete_by_owner(owner_id).await?;
        self.unlink_all(&removed).await;
        info!(owner_id, count = removed.len(), "Trash emptied");
        Ok(removed.len() as u64)
    }

    /// Delete trash entries whose retention ran out. Returns the number removed.
    pub async fn clean_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = self.trash_repo().delete_expired(now).await?;
        self.unlink_all(&removed).await;
        Ok(removed.len() as u64)
    }

    async fn unlink_all(&self, entries: &[TrashEntry]) {
        for entry in entries {
            self.storage.remove_quietly(&entry.path).await;
        }
    }

    /// Storage usage summary for a user.
    pub async fn usage(&self, owner_id: i64) -> Result<StorageUsage> {
        let files = self.files();
        Ok(StorageUsage {
            used: files.storage_used(owner_id).await?,
            quota: self.policy.quota_bytes(),
            file_count: files.count_by_owner(owner_id).await?,
            by_category: files.count_by_category(owner_id).await?,
        })
    }

    /// Get the storage used by this service.
    pub fn storage(&self) -> &FileStorage {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::parse_db_string;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;
    use chrono::Duration;
    use tempfile::TempDir;

    struct Fixture {
        db: Database,
        storage: FileStorage,
        policy: UploadPolicy,
        _temp_dir: TempDir,
    }

    impl Fixture {
        fn service(&self) -> FileService<'_> {
            FileService::new(self.db.pool(), &self.storage, &self.policy, 30)
        }
    }

    async fn setup(quota: u64) -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), "user_files", "public_files").unwrap();
        let policy = UploadPolicy::new(quota, [".txt", ".md", ".py", ".png"]);
        Fixture {
            db,
            storage,
            policy,
            _temp_dir: temp_dir,
        }
    }

    async fn create_user(db: &Database, username: &str) -> i64 {
        UserRepository::new(db.pool())
            .create(&NewUser::new(
                username,
                format!("{username}@example.com"),
                "hash",
            ))
            .await
            .unwrap()
            .id
    }

    fn stored_file_count(storage: &FileStorage) -> usize {
        walk(storage.root())
    }

    fn walk(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .map(|p| if p.is_dir() { walk(&p) } else { 1 })
            .sum()
    }

    #[tokio::test]
    async fn test_upload_private_and_public() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();

        let private = service
            .upload(owner, UploadRequest::new("notes.md", b"# hi".to_vec()))
            .await
            .unwrap();
        assert!(!private.is_public);
        assert!(private.path.starts_with(&format!("user_files/{owner}/")));
        assert_eq!(private.category, Category::Memo);
        assert_eq!(private.size, 4);
        assert!(private.mime_type.starts_with("text/"));

        let public = service
            .upload(
                owner,
                UploadRequest::new("main.py", b"print(1)".to_vec())
                    .with_public(true)
                    .with_category(Category::Other)
                    .with_description("  script  "),
            )
            .await
            .unwrap();
        assert!(public.path.starts_with("public_files/"));
        assert_eq!(public.category, Category::Other);
        assert_eq!(public.description, "script");
        assert!(fx.storage.exists(&public.path));
    }

    #[tokio::test]
    async fn test_upload_rejects_extension_before_write() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;

        let result = fx
            .service()
            .upload(owner, UploadRequest::new("virus.exe", vec![0; 10]))
            .await;
        assert!(matches!(result, Err(CloudboxError::Validation(_))));
        assert_eq!(stored_file_count(&fx.storage), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_names() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();

        for name in ["a/b.txt", "   ", "what?.txt"] {
            let result = service
                .upload(owner, UploadRequest::new(name, b"x".to_vec()))
                .await;
            assert!(matches!(result, Err(CloudboxError::Validation(_))), "{name}");
        }
        let long = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        let result = service
            .upload(
                owner,
                UploadRequest::new("a.txt", b"x".to_vec()).with_description(long),
            )
            .await;
        assert!(matches!(result, Err(CloudboxError::Validation(_))));
    }

    #[tokio::test]
    async fn test_quota_scenario() {
        let fx = setup(500).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();

        let result = service
            .upload(owner, UploadRequest::new("big.txt", vec![b'a'; 600]))
            .await;
        assert!(matches!(
            result,
            Err(CloudboxError::StorageExceeded {
                used: 0,
                incoming: 600,
                limit: 500
            })
        ));
        assert!(service.list_own(owner).await.unwrap().is_empty());
        assert_eq!(stored_file_count(&fx.storage), 0);

        for name in ["one.txt", "two.txt"] {
            service
                .upload(owner, UploadRequest::new(name, vec![b'a'; 200]))
                .await
                .unwrap();
        }
        assert_eq!(service.usage(owner).await.unwrap().used, 400);

        let result = service
            .upload(owner, UploadRequest::new("three.txt", vec![b'a'; 150]))
            .await;
        assert!(matches!(result, Err(CloudboxError::StorageExceeded { .. })));
        assert_eq!(service.list_own(owner).await.unwrap().len(), 2);
        assert_eq!(stored_file_count(&fx.storage), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        // A plain file where the user's directory should be
        let blocker = fx.storage.root().join("user_files").join(owner.to_string());
        std::fs::write(&blocker, b"").unwrap();

        let result = fx
            .service()
            .upload(owner, UploadRequest::new("notes.txt", b"hello".to_vec()))
            .await;
        assert!(matches!(result, Err(CloudboxError::Io(_))));
        assert!(fx.service().list_own(owner).await.unwrap().is_empty());
        assert_eq!(stored_file_count(&fx.storage), 1);
        assert!(blocker.is_file());
    }

    #[tokio::test]
    async fn test_create_text() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();

        let file = service
            .create_text(
                owner,
                CreateTextRequest {
                    filename: "todo.txt".to_string(),
                    content: "buy milk".to_string(),
                    is_public: false,
                    description: None,
                    category: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(file.original_name, "todo.txt");

        let (_, content) = service
            .view(file.id, &Actor::user(owner, false))
            .await
            .unwrap();
        assert!(matches!(content, FileContent::Text { ref text, .. } if text == "buy milk"));
    }

    #[tokio::test]
    async fn test_access_rules() {
        let fx = setup(1000).await;
        let alice = create_user(&fx.db, "alice").await;
        let bob = create_user(&fx.db, "bob").await;
        let service = fx.service();

        let private = service
            .upload(alice, UploadRequest::new("a.txt", b"secret".to_vec()))
            .await
            .unwrap();
        let public = service
            .upload(
                alice,
                UploadRequest::new("b.txt", b"shared".to_vec()).with_public(true),
            )
            .await
            .unwrap();

        let bob_actor = Actor::user(bob, false);
        assert!(matches!(
            service.download(private.id, &bob_actor).await,
            Err(CloudboxError::NotFound(_))
        ));
        let (_, bytes) = service
            .download(public.id, &Actor::anonymous())
            .await
            .unwrap();
        assert_eq!(bytes, b"shared");
        assert!(matches!(
            service.rename(public.id, &bob_actor, "x.txt").await,
            Err(CloudboxError::Permission(_))
        ));
        assert!(service
            .download(private.id, &Actor::user(99, true))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rename_rejects_slash_without_mutation() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let actor = Actor::user(owner, false);
        let file = service
            .upload(owner, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();

        assert!(service.rename(file.id, &actor, "b/c.txt").await.is_err());
        assert_eq!(service.get(file.id, &actor).await.unwrap().original_name, "a.txt");

        let renamed = service.rename(file.id, &actor, "c.txt").await.unwrap();
        assert_eq!(renamed.original_name, "c.txt");

        let moved = service
            .move_to_category(file.id, &actor, Category::Code)
            .await
            .unwrap();
        assert_eq!(moved.category, Category::Code);
    }

    #[tokio::test]
    async fn test_set_visibility_relocates() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let actor = Actor::user(owner, false);
        let file = service
            .upload(owner, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();

        let shared = service.set_visibility(file.id, &actor, true).await.unwrap();
        assert!(shared.is_public);
        assert!(shared.path.starts_with("public_files/"));
        assert!(fx.storage.exists(&shared.path));
        assert!(!fx.storage.exists(&file.path));

        let back = service.set_visibility(file.id, &actor, false).await.unwrap();
        assert_eq!(back.path, file.path);
        assert!(fx.storage.exists(&file.path));
    }

    #[tokio::test]
    async fn test_trash_restore_roundtrip() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let actor = Actor::user(owner, false);
        let file = service
            .upload(owner, UploadRequest::new("a.txt", vec![b'a'; 100]))
            .await
            .unwrap();

        let entry = service.trash(file.id, &actor).await.unwrap();
        let deleted = parse_db_string(&entry.deleted_at).unwrap();
        let expires = parse_db_string(&entry.expire_at).unwrap();
        assert_eq!(expires - deleted, Duration::days(30));
        assert!(service.list_own(owner).await.unwrap().is_empty());
        assert_eq!(service.usage(owner).await.unwrap().used, 0);
        assert_eq!(service.list_trash(owner).await.unwrap().len(), 1);
        assert!(fx.storage.exists(&file.path));

        assert!(matches!(
            service.trash(file.id, &actor).await,
            Err(CloudboxError::NotFound(_))
        ));

        let restored = service.restore(entry.id, &actor).await.unwrap();
        assert_eq!(restored.id, file.id);
        assert_eq!(restored.path, file.path);
        assert_eq!(restored.created_at, file.created_at);
        assert_eq!(service.usage(owner).await.unwrap().used, 100);
    }

    #[tokio::test]
    async fn test_trash_access_for_strangers() {
        let fx = setup(1000).await;
        let alice = create_user(&fx.db, "alice").await;
        let bob = create_user(&fx.db, "bob").await;
        let service = fx.service();
        let file = service
            .upload(alice, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        let entry = service
            .trash(file.id, &Actor::user(alice, false))
            .await
            .unwrap();

        assert!(matches!(
            service.restore(entry.id, &Actor::user(bob, false)).await,
            Err(CloudboxError::NotFound(_))
        ));
        assert!(matches!(
            service
                .permanent_delete(entry.id, &Actor::user(bob, false))
                .await,
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_permanent_delete_unlinks() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let actor = Actor::user(owner, false);
        let file = service
            .upload(owner, UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        let entry = service.trash(file.id, &actor).await.unwrap();

        service.permanent_delete(entry.id, &actor).await.unwrap();
        assert!(!fx.storage.exists(&file.path));
        assert!(service.list_trash(owner).await.unwrap().is_empty());
        assert!(matches!(
            service.permanent_delete(entry.id, &actor).await,
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clean_expired_and_empty() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let actor = Actor::user(owner, false);
        let now = Utc::now();

        let old = service
            .upload(owner, UploadRequest::new("old.txt", b"x".to_vec()))
            .await
            .unwrap();
        let fresh = service
            .upload(owner, UploadRequest::new("fresh.txt", b"y".to_vec()))
            .await
            .unwrap();
        service
            .trash_at(old.id, &actor, now - Duration::days(31))
            .await
            .unwrap();
        service.trash_at(fresh.id, &actor, now).await.unwrap();

        assert_eq!(service.clean_expired(now).await.unwrap(), 1);
        assert!(!fx.storage.exists(&old.path));
        assert!(fx.storage.exists(&fresh.path));

        assert_eq!(service.empty_trash(owner).await.unwrap(), 1);
        assert_eq!(stored_file_count(&fx.storage), 0);
    }

    #[tokio::test]
    async fn test_view_image_skips_decoding() {
        let fx = setup(1000).await;
        let owner = create_user(&fx.db, "alice").await;
        let service = fx.service();
        let file = service
            .upload(owner, UploadRequest::new("pic.png", vec![0x89, b'P', b'N', b'G']))
            .await
            .unwrap();
        assert_eq!(file.category, Category::Image);

        let (_, content) = service
            .view(file.id, &Actor::user(owner, false))
            .await
            .unwrap();
        assert!(matches!(content, FileContent::Image { .. }));
    }
}
