//! Access control for files and recycle-bin entries.
//!
//! Private files are invisible to anyone but their owner and admins: a
//! stranger asking for one gets "not found", never "forbidden". Forbidden
//! is only returned when the caller can already see the file.

use crate::file::FileRecord;
use crate::{CloudboxError, Result};

/// The party performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor {
    /// Authenticated user ID, None for anonymous requests.
    pub user_id: Option<i64>,
    /// Whether the user is an administrator.
    pub is_admin: bool,
}

impl Actor {
    /// Anonymous caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated caller.
    pub fn user(user_id: i64, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin,
        }
    }

    /// Check whether the actor owns a resource.
    pub fn owns(&self, owner_id: i64) -> bool {
        self.user_id == Some(owner_id)
    }

    /// Check whether the actor owns the resource or is an admin.
    pub fn owns_or_admin(&self, owner_id: i64) -> bool {
        self.is_admin || self.owns(owner_id)
    }
}

/// Kind of file operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// View metadata, content or download.
    Read,
    /// Rename, recategorize, change visibility or trash.
    Mutate,
}

/// Decide whether `actor` may perform `action` on `file`.
pub fn check_file_access(file: &FileRecord, actor: &Actor, action: FileAction) -> Result<()> {
    let privileged = actor.owns_or_admin(file.owner_id);
    match action {
        FileAction::Read if file.is_public || privileged => Ok(()),
        FileAction::Mutate if privileged => Ok(()),
        FileAction::Mutate if file.is_public => Err(CloudboxError::Permission(
            "only the owner can modify this file".to_string(),
        )),
        _ => Err(CloudboxError::NotFound("file".to_string())),
    }
}

/// Decide whether `actor` may see or act on a trash entry owned by `owner_id`.
pub fn check_trash_access(owner_id: i64, actor: &Actor) -> Result<()> {
    if actor.owns_or_admin(owner_id) {
        Ok(())
    } else {
        Err(CloudboxError::NotFound("trash entry".to_string()))
    }
}

/// Require administrator rights.
pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(CloudboxError::Permission(
            "administrator access required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Category;

    fn file(owner_id: i64, is_public: bool) -> FileRecord {
        FileRecord {
            id: 1,
            owner_id,
            stored_name: "abc.txt".to_string(),
            original_name: "notes.txt".to_string(),
            path: "user_files/1/abc.txt".to_string(),
            size: 10,
            mime_type: "text/plain".to_string(),
            category: Category::Memo,
            is_public,
            description: String::new(),
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_public_file_readable_by_anyone() {
        let f = file(1, true);
        assert!(check_file_access(&f, &Actor::anonymous(), FileAction::Read).is_ok());
        assert!(check_file_access(&f, &Actor::user(2, false), FileAction::Read).is_ok());
    }

    #[test]
    fn test_private_file_hidden_from_strangers() {
        let f = file(1, false);
        assert!(matches!(
            check_file_access(&f, &Actor::anonymous(), FileAction::Read),
            Err(CloudboxError::NotFound(_))
        ));
        assert!(matches!(
            check_file_access(&f, &Actor::user(2, false), FileAction::Read),
            Err(CloudboxError::NotFound(_))
        ));
        assert!(matches!(
            check_file_access(&f, &Actor::user(2, false), FileAction::Mutate),
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[test]
    fn test_owner_and_admin_allowed() {
        let f = file(1, false);
        assert!(check_file_access(&f, &Actor::user(1, false), FileAction::Read).is_ok());
        assert!(check_file_access(&f, &Actor::user(1, false), FileAction::Mutate).is_ok());
        assert!(check_file_access(&f, &Actor::user(9, true), FileAction::Read).is_ok());
        assert!(check_file_access(&f, &Actor::user(9, true), FileAction::Mutate).is_ok());
    }

    #[test]
    fn test_public_file_mutation_forbidden_for_others() {
        let f = file(1, true);
        assert!(matches!(
            check_file_access(&f, &Actor::user(2, false), FileAction::Mutate),
            Err(CloudboxError::Permission(_))
        ));
        assert!(matches!(
            check_file_access(&f, &Actor::anonymous(), FileAction::Mutate),
            Err(CloudboxError::Permission(_))
        ));
    }

    #[test]
    fn test_trash_access() {
        assert!(check_trash_access(1, &Actor::user(1, false)).is_ok());
        assert!(check_trash_access(1, &Actor::user(5, true)).is_ok());
        assert!(matches!(
            check_trash_access(1, &Actor::user(2, false)),
            Err(CloudboxError::NotFound(_))
        ));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&Actor::user(1, true)).is_ok());
        assert!(matches!(
            require_admin(&Actor::user(1, false)),
            Err(CloudboxError::Permission(_))
        ));
    }
}
