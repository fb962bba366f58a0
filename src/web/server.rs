//! Web server for cloudbox.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::{CloudboxError, Database, Result};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::{create_health_router, create_router, create_swagger_router, RouterOptions};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Router options.
    options: RouterOptions,
    /// Seconds between clean-up sweeps.
    cleanup_interval_secs: u64,
}

impl WebServer {
    /// Create a new web server from configuration and an open database.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| CloudboxError::Config(format!("invalid server address: {e}")))?;

        let app_state = AppState::from_config(db, config)?;
        let jwt_state = Arc::new(JwtState::new(&config.server.jwt_secret));

        let options = RouterOptions {
            cors_origins: config.server.cors_origins.clone(),
            login_rate_limit: config.server.login_rate_limit,
            api_rate_limit: config.server.api_rate_limit,
            body_limit: (config.server.max_upload_size_mb * 1024 * 1024) as usize,
        };

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            options,
            cleanup_interval_secs: config.trash.cleanup_interval_secs,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the background clean-up task.
    ///
    /// Every interval this removes expired verification codes and trash
    /// entries whose retention ran out, unlinking their bytes.
    fn start_cleanup_task(app_state: Arc<AppState>, interval_secs: u64) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                sweep(&app_state).await;
            }
        });
    }

    fn build_router(&self) -> Router {
        create_router(self.app_state.clone(), self.jwt_state.clone(), &self.options)
            .merge(create_health_router())
            .merge(create_swagger_router())
            .layer(CompressionLayer::new())
    }

    async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start the clean-up task after a successful bind
        Self::start_cleanup_task(self.app_state.clone(), self.cleanup_interval_secs);
        tracing::info!(
            interval_secs = self.cleanup_interval_secs,
            "Clean-up task started"
        );
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, local_addr))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.build_router();
        let (listener, _) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.build_router();
        let (listener, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// Remove expired verification codes and expired trash entries once.
pub async fn sweep(app_state: &AppState) {
    match app_state.verification().cleanup_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(deleted_count = count, "Cleaned up expired verification codes");
        }
        Ok(_) => tracing::debug!("No expired verification codes to clean up"),
        Err(e) => tracing::warn!(error = %e, "Failed to clean up verification codes"),
    }

    match app_state.files().clean_expired(Utc::now()).await {
        Ok(count) if count > 0 => {
            tracing::info!(deleted_count = count, "Cleaned up expired trash entries");
        }
        Ok(_) => tracing::debug!("No expired trash entries to clean up"),
        Err(e) => tracing::warn!(error = %e, "Failed to clean up trash"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.jwt_secret = "test-secret-key".to_string();
        config.storage.root = dir.path().join("storage").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert!(dir.path().join("storage").join("public_files").is_dir());
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.server.host = "not an address".to_string();
        let db = Database::open_in_memory().await.unwrap();

        assert!(matches!(
            WebServer::new(&config, db),
            Err(CloudboxError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_codes() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);
        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::from_config(db, &config).unwrap();

        state
            .verification()
            .issue_at("old@example.com", Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        state.verification().issue("new@example.com").await.unwrap();

        sweep(&state).await;

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_codes")
            .fetch_one(state.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
