//! Upload rules: allowed extensions, per-user quota and filename legality.

use crate::config::StorageConfig;
use crate::file::storage::extension_of;
use crate::file::MAX_FILENAME_LENGTH;
use crate::{CloudboxError, Result};

/// Characters never allowed in a filename.
pub const FORBIDDEN_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Quota and extension rules applied to new files.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    quota_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    /// Create a policy. Extensions are normalized to lowercase with a dot.
    pub fn new<I, S>(quota_bytes: u64, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref().trim().trim_start_matches('.').to_lowercase()))
            .collect();
        Self {
            quota_bytes,
            allowed_extensions,
        }
    }

    /// Create a policy from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.quota_bytes(), &config.allowed_extensions)
    }

    /// Per-user quota in bytes.
    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Allowed extensions, each with a leading dot.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Reject filenames whose extension is not allowed.
    pub fn check_extension(&self, filename: &str) -> Result<()> {
        let allowed = extension_of(filename)
            .is_some_and(|ext| self.allowed_extensions.iter().any(|a| *a == ext));
        if allowed {
            Ok(())
        } else {
            Err(CloudboxError::Validation(format!(
                "file type not allowed, allowed extensions: {}",
                self.allowed_extensions.join(", ")
            )))
        }
    }

    /// Reject an incoming file that would push usage past the quota.
    pub fn check_quota(&self, used: u64, incoming: u64) -> Result<()> {
        if used.saturating_add(incoming) > self.quota_bytes {
            Err(CloudboxError::StorageExceeded {
                used,
                incoming,
                limit: self.quota_bytes,
            })
        } else {
            Ok(())
        }
    }
}

/// Check that a user supplied filename is legal and return it trimmed.
pub fn validate_filename(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CloudboxError::Validation(
            "filename must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(CloudboxError::Validation(format!(
            "filename must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if name
        .chars()
        .any(|c| c.is_control() || FORBIDDEN_FILENAME_CHARS.contains(&c))
    {
        return Err(CloudboxError::Validation(
            "filename contains illegal characters: / \\ : * ? \" < > |".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(CloudboxError::Validation("invalid filename".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::new(500, [".txt", "md", ".PNG"])
    }

    #[test]
    fn test_extensions_normalized() {
        assert_eq!(policy().allowed_extensions(), &[".txt", ".md", ".png"]);
    }

    #[test]
    fn test_check_extension() {
        let policy = policy();
        assert!(policy.check_extension("a.txt").is_ok());
        assert!(policy.check_extension("A.TXT").is_ok());
        assert!(policy.check_extension("pic.png").is_ok());

        let err = policy.check_extension("run.exe").unwrap_err();
        assert!(err.to_string().contains(".txt, .md, .png"));
        assert!(policy.check_extension("noext").is_err());
    }

    #[test]
    fn test_check_quota() {
        let policy = policy();
        assert!(policy.check_quota(0, 500).is_ok());
        assert!(policy.check_quota(400, 100).is_ok());

        match policy.check_quota(400, 150) {
            Err(CloudboxError::StorageExceeded {
                used,
                incoming,
                limit,
            }) => {
                assert_eq!((used, incoming, limit), (400, 150, 500));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(policy.check_quota(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_from_config() {
        let policy = UploadPolicy::from_config(&StorageConfig::default());
        assert_eq!(policy.quota_bytes(), 500 * 1024 * 1024);
        assert!(policy.check_extension("main.cs").is_ok());
        assert!(policy.check_extension("photo.webp").is_ok());
        assert!(policy.check_extension("archive.zip").is_err());
    }

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename("  notes.md ").unwrap(), "notes.md");
        assert!(validate_filename("日本語.txt").is_ok());

        for bad in ["", "   ", "a/b.txt", "a\\b", "c:d", "x*", "q?", "\"", "<a>", "p|q", "tab\t", "..", "."] {
            assert!(validate_filename(bad).is_err(), "accepted {bad:?}");
        }

        let long = format!("{}.txt", "a".repeat(252));
        assert!(validate_filename(&long).is_err());
        let max = format!("{}.txt", "a".repeat(251));
        assert!(validate_filename(&max).is_ok());
    }
}
