//! cloudbox - personal cloud storage
//!
//! Users register with an email verification code, upload or write files,
//! share them publicly, comment on public files and keep deleted files in
//! a recycle bin for 30 days. Everything is served as a JSON API.

pub mod auth;
pub mod comment;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod mail;
pub mod web;

pub use auth::{
    change_password, change_username, check_file_access, ensure_admin, get_profile,
    hash_password, register, require_admin, validate_password, verify_password, Actor,
    FileAction, PasswordError, ProfileError, RegistrationError, RegistrationRequest,
    UserProfile, ValidationError, VerificationService,
};
pub use comment::{Comment, CommentRepository, CommentWithAuthor};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository, UserUpdate};
pub use error::{CloudboxError, Result};
pub use file::{
    Category, FileContent, FileRecord, FileRepository, FileService, FileStorage, TrashEntry,
    TrashRepository, UploadPolicy, UploadRequest,
};
pub use mail::Mailer;
pub use web::WebServer;
