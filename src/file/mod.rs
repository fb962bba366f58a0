//! File management module for cloudbox.
//!
//! This module provides:
//! - File metadata and the closed category list
//! - Physical storage split into a public and a per-user private area
//! - Upload rules (extension allow-list, quota, filename legality)
//! - The recycle bin with timed expiry
//! - Text decoding for in-browser viewing

mod metadata;
mod policy;
pub mod reader;
mod service;
mod storage;
mod trash;

pub use metadata::{Category, FileRecord, FileRepository, NewFile};
pub use policy::{validate_filename, UploadPolicy, FORBIDDEN_FILENAME_CHARS};
pub use reader::{read_content, FileContent};
pub use service::{CreateTextRequest, FileService, StorageUsage, UploadRequest};
pub use storage::{extension_of, FileStorage};
pub use trash::{TrashEntry, TrashRepository, DEFAULT_RETENTION_DAYS};

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum length for file description (in characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
