//! Shared helpers for the web API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestRequest, TestServer};
use cloudbox::file::{FileStorage, UploadPolicy};
use cloudbox::web::middleware::JwtState;
use cloudbox::web::{create_router, AppState, RouterOptions};
use cloudbox::{hash_password, Database, Mailer, NewUser, UserRepository};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const PASSWORD: &str = "password123";

/// A running test server with its database and storage root.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    /// Keeps the storage directory alive for the test.
    pub dir: TempDir,
}

impl TestApp {
    /// Create a test app with the default 500 MB quota.
    pub async fn new() -> Self {
        Self::with_quota(500 * 1024 * 1024).await
    }

    /// Create a test app with a quota in bytes.
    pub async fn with_quota(quota_bytes: u64) -> Self {
        Self::with_limits(quota_bytes, RouterOptions::default().body_limit).await
    }

    /// Create a test app with a quota and a request body limit, both in bytes.
    pub async fn with_limits(quota_bytes: u64, body_limit: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let storage = FileStorage::new(dir.path(), "user_files", "public_files")
            .expect("Failed to create storage");
        let policy = UploadPolicy::new(
            quota_bytes,
            [".txt", ".md", ".py", ".json", ".png", ".jpg"],
        );

        let state = Arc::new(AppState::new(
            db,
            storage,
            policy,
            Mailer::Log,
            JWT_SECRET,
            900,
        ));
        let jwt_state = Arc::new(JwtState::new(JWT_SECRET));

        let options = RouterOptions {
            login_rate_limit: 1000,
            api_rate_limit: 10000,
            body_limit,
            ..Default::default()
        };
        let router = create_router(state.clone(), jwt_state, &options);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, state, dir }
    }

    /// Read the newest verification code stored for an email.
    pub async fn stored_code(&self, email: &str) -> String {
        sqlx::query_scalar("SELECT code FROM verification_codes WHERE email = ? ORDER BY id DESC")
            .bind(email)
            .fetch_one(self.state.pool())
            .await
            .expect("No verification code stored")
    }

    /// Register a user through the code flow and return the response body.
    pub async fn register(&self, username: &str, email: &str) -> Value {
        self.server
            .post("/api/auth/send-code")
            .json(&json!({ "email": email, "username": username }))
            .await
            .assert_status_ok();

        let code = self.stored_code(email).await;
        let response = self
            .server
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "verification_code": code,
                "password": PASSWORD,
                "confirm_password": PASSWORD
            }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    /// Log in and return the access token.
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "identifier": identifier, "password": password }))
            .await;
        response.assert_status_ok();
        access_token(&response.json::<Value>())
    }

    /// Register and log in a user; returns (user id, token).
    pub async fn member(&self, username: &str) -> (i64, String) {
        let body = self
            .register(username, &format!("{username}@example.com"))
            .await;
        let id = body["data"]["id"].as_i64().expect("user id");
        let token = self.login(username, PASSWORD).await;
        (id, token)
    }

    /// Insert an administrator directly and log in; returns (user id, token).
    pub async fn admin(&self) -> (i64, String) {
        let hash = hash_password(PASSWORD).expect("Failed to hash password");
        let user = UserRepository::new(self.state.pool())
            .create(
                &NewUser::new("admin", "admin@example.com", hash)
                    .with_admin(true)
                    .with_verified(true),
            )
            .await
            .expect("Failed to create admin");
        let token = self.login("admin", PASSWORD).await;
        (user.id, token)
    }

    /// Upload bytes as a file; returns the raw response.
    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        content: &[u8],
        is_public: bool,
    ) -> axum_test::TestResponse {
        let form = MultipartForm::new()
            .add_text("is_public", is_public.to_string())
            .add_part(
                "file",
                Part::bytes(content.to_vec()).file_name(filename.to_string()),
            );
        authed(self.server.post("/api/files/upload"), token)
            .multipart(form)
            .await
    }

    /// Upload a file that must succeed; returns its id.
    pub async fn upload_ok(&self, token: &str, filename: &str, content: &[u8], is_public: bool) -> i64 {
        let response = self.upload(token, filename, content, is_public).await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("file id")
    }
}

/// Attach a bearer token to a request.
pub fn authed(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(AUTHORIZATION, format!("Bearer {}", token))
}

/// Get access token from a login response.
pub fn access_token(response: &Value) -> String {
    response["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}
