//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::UserProfile;
use crate::comment::CommentWithAuthor;
use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::file::{Category, FileContent, FileRecord, StorageUsage, TrashEntry};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always true.
    pub success: bool,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Create a new API response with a message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Create a response that only carries a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_message(message, ())
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// User information in responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// "admin" or "member".
    pub role: String,
    /// Administrator flag.
    pub is_admin: bool,
    /// Account creation timestamp.
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            role: user.role().to_string(),
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: to_rfc3339(&user.created_at),
        }
    }
}

impl From<UserProfile> for UserInfo {
    fn from(profile: UserProfile) -> Self {
        Self {
            role: if profile.is_admin { "admin" } else { "member" }.to_string(),
            id: profile.id,
            username: profile.username,
            email: profile.email,
            is_admin: profile.is_admin,
            created_at: to_rfc3339(&profile.created_at),
        }
    }
}

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

/// Verification code dispatch result.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendCodeResponse {
    /// Email the code was issued for.
    pub email: String,
    /// Seconds until the code expires.
    pub expires_in: i64,
    /// False when mail delivery failed and the code was only logged.
    pub delivered: bool,
}

// ============================================================================
// File DTOs
// ============================================================================

/// File metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: i64,
    pub owner_id: i64,
    /// Owner's username, filled in on shared listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Name shown to users.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    pub mime_type: String,
    pub category: Category,
    /// Icon name for the category.
    pub icon: String,
    pub is_public: bool,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            owner_id: file.owner_id,
            owner_name: None,
            name: file.original_name,
            size: file.size,
            mime_type: file.mime_type,
            icon: file.category.icon().to_string(),
            category: file.category,
            is_public: file.is_public,
            description: file.description,
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
        }
    }
}

impl FileResponse {
    /// Attach the owner's username.
    pub fn with_owner(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }
}

/// Number of files in one category.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category: Category,
    pub count: i64,
}

/// Storage usage summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    /// Bytes used by live files.
    pub used: u64,
    /// Quota in bytes.
    pub quota: u64,
    /// Used share of the quota in percent.
    pub percent: f64,
    /// Number of live files.
    pub file_count: i64,
    /// Files per category.
    pub by_category: Vec<CategoryCount>,
}

impl From<StorageUsage> for UsageResponse {
    fn from(usage: StorageUsage) -> Self {
        Self {
            percent: (usage.percent() * 100.0).round() / 100.0,
            used: usage.used,
            quota: usage.quota,
            file_count: usage.file_count,
            by_category: usage
                .by_category
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        }
    }
}

/// The caller's files and storage usage.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub usage: UsageResponse,
}

/// Viewable file content.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileContentResponse {
    pub file: FileResponse,
    /// "text" or "image".
    pub kind: String,
    /// Decoded text, absent for images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Detected encoding, absent for images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// True when undecodable bytes were replaced.
    pub lossy: bool,
}

impl FileContentResponse {
    /// Build from a file and its decoded content.
    pub fn new(file: FileRecord, content: FileContent) -> Self {
        let file = FileResponse::from(file);
        match content {
            FileContent::Text {
                text,
                encoding,
                lossy,
            } => Self {
                file,
                kind: "text".to_string(),
                content: Some(text),
                encoding: Some(encoding.to_string()),
                lossy,
            },
            FileContent::Image { .. } => Self {
                file,
                kind: "image".to_string(),
                content: None,
                encoding: None,
                lossy: false,
            },
        }
    }
}

/// Entry of the closed category list.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub name: Category,
    pub label: String,
    pub icon: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            name: category,
            label: category.label().to_string(),
            icon: category.icon().to_string(),
        }
    }
}

// ============================================================================
// Trash DTOs
// ============================================================================

/// Recycle bin entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrashEntryResponse {
    /// Trash entry ID.
    pub id: i64,
    /// ID of the file before it was trashed.
    pub file_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub size: i64,
    pub category: Category,
    pub is_public: bool,
    pub description: String,
    pub deleted_at: String,
    pub expire_at: String,
}

impl From<TrashEntry> for TrashEntryResponse {
    fn from(entry: TrashEntry) -> Self {
        Self {
            id: entry.id,
            file_id: entry.file_id,
            owner_id: entry.owner_id,
            name: entry.original_name,
            size: entry.size,
            category: entry.category,
            is_public: entry.is_public,
            description: entry.description,
            deleted_at: to_rfc3339(&entry.deleted_at),
            expire_at: to_rfc3339(&entry.expire_at),
        }
    }
}

/// Number of removed items.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

// ============================================================================
// Comment DTOs
// ============================================================================

/// A comment with its author.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i64,
    pub file_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
    /// Whether the caller may delete this comment.
    pub can_delete: bool,
}

impl CommentResponse {
    /// Build for a caller, who may be anonymous.
    pub fn new(comment: CommentWithAuthor, viewer: Option<(i64, bool)>) -> Self {
        let can_delete = viewer.is_some_and(|(id, is_admin)| comment.can_delete(id, is_admin));
        Self {
            id: comment.id,
            file_id: comment.file_id,
            author_id: comment.author_id,
            author_name: comment.author_name,
            content: comment.content,
            created_at: to_rfc3339(&comment.created_at),
            can_delete,
        }
    }
}

/// Outcome of a comment deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ============================================================================
// Admin DTOs
// ============================================================================

/// Site totals for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub users: i64,
    pub files: i64,
    pub public_files: i64,
    pub private_files: i64,
    pub comments: i64,
    pub trash: i64,
}

/// User row in the admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    #[serde(flatten)]
    pub user: UserInfo,
    /// Number of live files.
    pub file_count: i64,
    /// Bytes used by live files.
    pub storage_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_shape() {
        let json = serde_json::to_value(ApiResponse::new(5)).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["message"].is_null());
        assert_eq!(json["data"], 5);

        let json = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(json["message"], "done");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_category_response() {
        let json = serde_json::to_value(CategoryResponse::from(Category::Code)).unwrap();
        assert_eq!(json["name"], "code");
        assert_eq!(json["icon"], "bi-code-slash");
    }

    #[test]
    fn test_usage_percent_rounded() {
        let usage = StorageUsage {
            used: 1,
            quota: 3,
            file_count: 1,
            by_category: vec![(Category::Memo, 1)],
        };
        let response = UsageResponse::from(usage);
        assert_eq!(response.percent, 33.33);
        assert_eq!(response.by_category[0].category, Category::Memo);
    }
}
