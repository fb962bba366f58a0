//! Error types for cloudbox.

use thiserror::Error;

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

/// Common error type for cloudbox.
#[derive(Error, Debug)]
pub enum CloudboxError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness conflict (duplicate username, email, or a blocked delete).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upload would push the owner past the storage quota.
    #[error(
        "storage limit exceeded: {:.2} MB used, file is {:.2} MB, limit is {:.2} MB",
        megabytes(.used),
        megabytes(.incoming),
        megabytes(.limit)
    )]
    StorageExceeded {
        /// Bytes currently used by the owner.
        used: u64,
        /// Size of the rejected upload in bytes.
        incoming: u64,
        /// Quota in bytes.
        limit: u64,
    },

    /// Mail dispatch error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for CloudboxError {
    fn from(e: sqlx::Error) -> Self {
        CloudboxError::Database(e.to_string())
    }
}

/// Result type alias for cloudbox operations.
pub type Result<T> = std::result::Result<T, CloudboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = CloudboxError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_permission_error_display() {
        let err = CloudboxError::Permission("admin access required".to_string());
        assert_eq!(err.to_string(), "permission denied: admin access required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = CloudboxError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_storage_exceeded_display() {
        let err = CloudboxError::StorageExceeded {
            used: 400 * 1024 * 1024,
            incoming: 150 * 1024 * 1024,
            limit: 500 * 1024 * 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("400.00 MB used"));
        assert!(msg.contains("150.00 MB"));
        assert!(msg.contains("500.00 MB"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CloudboxError = io_err.into();
        assert!(matches!(err, CloudboxError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(CloudboxError::Conflict("username taken".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
