//! Configuration module for cloudbox.

use serde::Deserialize;
use std::path::Path;

use crate::{CloudboxError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Rate limit for login and send-code endpoints (requests per minute).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for general API endpoints (requests per minute).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_jwt_access_expiry() -> u64 {
    86400 // 24 hours
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_api_rate_limit() -> u32 {
    300
}

fn default_max_upload_size() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/cloudbox.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all stored bytes.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Subdirectory holding per-user private files.
    #[serde(default = "default_private_dir")]
    pub private_dir: String,
    /// Subdirectory holding shared public files.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    /// Per-user quota in megabytes.
    #[serde(default = "default_quota_mb")]
    pub quota_mb: u64,
    /// Accepted file extensions, lowercase with leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_storage_root() -> String {
    "storage".to_string()
}

fn default_private_dir() -> String {
    "user_files".to_string()
}

fn default_public_dir() -> String {
    "public_files".to_string()
}

fn default_quota_mb() -> u64 {
    500
}

fn default_allowed_extensions() -> Vec<String> {
    [
        ".txt", ".md", ".cpp", ".py", ".js", ".html", ".css", ".json", ".xml", ".java", ".c",
        ".h", ".cs", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl StorageConfig {
    /// Quota in bytes.
    pub fn quota_bytes(&self) -> u64 {
        self.quota_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            private_dir: default_private_dir(),
            public_dir: default_public_dir(),
            quota_mb: default_quota_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Recycle bin configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrashConfig {
    /// Days a trashed file is kept before it is purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Interval between background sweeps in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_retention_days() -> i64 {
    30
}

fn default_cleanup_interval() -> u64 {
    3600
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Email verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Lifetime of an issued code in seconds.
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: i64,
}

fn default_code_ttl() -> i64 {
    600 // 10 minutes
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl(),
        }
    }
}

/// Bootstrap administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Administrator username.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Administrator email, used to detect an existing admin.
    #[serde(default = "default_admin_email")]
    pub email: String,
    /// Initial administrator password.
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

/// Outgoing mail configuration.
///
/// When `webhook_url` is unset, verification codes are only written to the log.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// HTTP endpoint that delivers mail.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Request timeout in seconds.
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

fn default_mail_from() -> String {
    "noreply@cloudbox.local".to_string()
}

fn default_mail_timeout() -> u64 {
    10
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            from: default_mail_from(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/cloudbox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Recycle bin configuration.
    #[serde(default)]
    pub trash: TrashConfig,
    /// Verification code configuration.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Bootstrap administrator.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CloudboxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CloudboxError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `CLOUDBOX_JWT_SECRET`
    /// - `CLOUDBOX_ADMIN_USERNAME`, `CLOUDBOX_ADMIN_EMAIL`, `CLOUDBOX_ADMIN_PASSWORD`
    /// - `CLOUDBOX_MAIL_WEBHOOK_URL`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        fn non_empty(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        }

        if let Some(secret) = non_empty("CLOUDBOX_JWT_SECRET") {
            self.server.jwt_secret = secret;
        }
        if let Some(username) = non_empty("CLOUDBOX_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(email) = non_empty("CLOUDBOX_ADMIN_EMAIL") {
            self.admin.email = email;
        }
        if let Some(password) = non_empty("CLOUDBOX_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(url) = non_empty("CLOUDBOX_MAIL_WEBHOOK_URL") {
            self.mail.webhook_url = Some(url);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - JWT secret is not set
    /// - quota is zero
    /// - admin password is empty
    /// - mail webhook URL is not a valid http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.server.jwt_secret.is_empty() {
            return Err(CloudboxError::Validation(
                "jwt_secret is not set. \
                 Set it in config.toml or via CLOUDBOX_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.storage.quota_mb == 0 {
            return Err(CloudboxError::Validation(
                "storage.quota_mb must be greater than zero".to_string(),
            ));
        }
        if self.admin.password.is_empty() {
            return Err(CloudboxError::Validation(
                "admin.password must not be empty".to_string(),
            ));
        }
        if let Some(ref webhook) = self.mail.webhook_url {
            let parsed = url::Url::parse(webhook).map_err(|e| {
                CloudboxError::Validation(format!("mail.webhook_url is invalid: {e}"))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(CloudboxError::Validation(
                    "mail.webhook_url must use http or https".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.cors_origins.is_empty());
        assert!(config.server.jwt_secret.is_empty());
        assert_eq!(config.server.jwt_access_token_expiry_secs, 86400);
        assert_eq!(config.server.max_upload_size_mb, 600);

        assert_eq!(config.database.path, "data/cloudbox.db");

        assert_eq!(config.storage.root, "storage");
        assert_eq!(config.storage.private_dir, "user_files");
        assert_eq!(config.storage.public_dir, "public_files");
        assert_eq!(config.storage.quota_mb, 500);
        assert_eq!(config.storage.quota_bytes(), 500 * 1024 * 1024);
        assert!(config.storage.allowed_extensions.contains(&".md".to_string()));
        assert!(config.storage.allowed_extensions.contains(&".png".to_string()));

        assert_eq!(config.trash.retention_days, 30);
        assert_eq!(config.trash.cleanup_interval_secs, 3600);

        assert_eq!(config.verification.code_ttl_secs, 600);

        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.email, "admin@example.com");

        assert!(config.mail.webhook_url.is_none());

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/cloudbox.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:5173"]
jwt_secret = "test-secret-key"
jwt_access_token_expiry_secs = 600
login_rate_limit = 3

[database]
path = "custom/db.sqlite"

[storage]
root = "/srv/cloudbox"
quota_mb = 100
allowed_extensions = [".txt", ".rs"]

[trash]
retention_days = 7
cleanup_interval_secs = 60

[verification]
code_ttl_secs = 300

[admin]
username = "root"
email = "root@example.org"
password = "hunter22"

[mail]
webhook_url = "https://mail.example.org/send"
from = "cloud@example.org"

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.server.jwt_secret, "test-secret-key");
        assert_eq!(config.server.jwt_access_token_expiry_secs, 600);
        assert_eq!(config.server.login_rate_limit, 3);

        assert_eq!(config.database.path, "custom/db.sqlite");

        assert_eq!(config.storage.root, "/srv/cloudbox");
        assert_eq!(config.storage.quota_mb, 100);
        assert_eq!(config.storage.allowed_extensions, vec![".txt", ".rs"]);
        // Unspecified fields keep defaults
        assert_eq!(config.storage.public_dir, "public_files");

        assert_eq!(config.trash.retention_days, 7);
        assert_eq!(config.trash.cleanup_interval_secs, 60);
        assert_eq!(config.verification.code_ttl_secs, 300);

        assert_eq!(config.admin.username, "root");
        assert_eq!(config.admin.email, "root@example.org");
        assert_eq!(config.admin.password, "hunter22");

        assert_eq!(
            config.mail.webhook_url.as_deref(),
            Some("https://mail.example.org/send")
        );
        assert_eq!(config.mail.from, "cloud@example.org");

        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "data/cloudbox.db");
        assert_eq!(config.storage.quota_mb, 500);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(CloudboxError::Validation(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(CloudboxError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("CLOUDBOX_ADMIN_EMAIL").ok();

        std::env::set_var("CLOUDBOX_ADMIN_EMAIL", "ops@example.org");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.admin.email, "ops@example.org");

        std::env::set_var("CLOUDBOX_ADMIN_EMAIL", "");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.admin.email, "admin@example.com");

        if let Some(val) = original {
            std::env::set_var("CLOUDBOX_ADMIN_EMAIL", val);
        } else {
            std::env::remove_var("CLOUDBOX_ADMIN_EMAIL");
        }
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        let result = config.validate();
        if let Err(CloudboxError::Validation(msg)) = result {
            assert!(msg.contains("jwt_secret"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let mut config = Config::default();
        config.server.jwt_secret = "secret".to_string();
        config.storage.quota_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_webhook() {
        let mut config = Config::default();
        config.server.jwt_secret = "secret".to_string();
        config.mail.webhook_url = Some("ftp://mail.example.org".to_string());
        assert!(config.validate().is_err());

        config.mail.webhook_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.mail.webhook_url = Some("http://localhost:8025/send".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(include_str!("../config.example.toml")).unwrap();
        let defaults = Config::default();

        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.storage.allowed_extensions, defaults.storage.allowed_extensions);
        assert_eq!(config.storage.quota_bytes(), 500 * 1024 * 1024);
        assert_eq!(config.trash.retention_days, 30);
        assert_eq!(config.verification.code_ttl_secs, 600);
        assert!(config.mail.webhook_url.is_none());
    }
}
