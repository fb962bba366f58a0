//! Authentication module for cloudbox.
//!
//! Password hashing, account validation, email verification codes,
//! registration, profile changes, admin bootstrap and access control.

pub mod bootstrap;
mod password;
pub mod permission;
pub mod profile;
mod registration;
pub mod validation;
pub mod verification;

pub use bootstrap::ensure_admin;
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use permission::{check_file_access, check_trash_access, require_admin, Actor, FileAction};
pub use profile::{change_password, change_username, get_profile, ProfileError, UserProfile};
pub use registration::{ensure_available, register, RegistrationError, RegistrationRequest};
pub use validation::ValidationError;
pub use verification::{generate_code, VerificationService, DEFAULT_CODE_TTL_SECS};
