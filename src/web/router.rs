//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    add_comment, admin_dashboard, admin_delete_file, admin_delete_user, admin_list_files,
    admin_list_trash, admin_list_users, change_password, change_username, create_file,
    delete_comment, delete_file, delete_permanently, download_file, empty_trash, get_file,
    get_profile, list_categories, list_comments, list_files, list_public_files, list_trash, login,
    logout, me, move_file, register, rename_file, restore_file, send_code, set_visibility,
    upload_file, view_file, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, jwt_auth, log_failures, login_rate_limit,
    security_headers, JwtState, RateLimitState,
};
use super::openapi::ApiDoc;

/// Options for building the API router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
    /// Login and send-code requests per minute per IP.
    pub login_rate_limit: u32,
    /// General API requests per minute per IP.
    pub api_rate_limit: u32,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            login_rate_limit: 10,
            api_rate_limit: 300,
            body_limit: 600 * 1024 * 1024,
        }
    }
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    options: &RouterOptions,
) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(
        options.login_rate_limit,
        options.api_rate_limit,
    ));

    // Credential endpoints get the stricter limit
    let login_limit = rate_limit_state.clone();
    let auth_limited_routes = Router::new()
        .route("/send-code", post(send_code))
        .route("/login", post(login))
        .layer(middleware::from_fn(move |req, next| {
            login_rate_limit(login_limit.clone(), req, next)
        }));

    let auth_routes = Router::new()
        .merge(auth_limited_routes)
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/me", get(me));

    let profile_routes = Router::new()
        .route("/", get(get_profile))
        .route("/username", post(change_username))
        .route("/password", post(change_password));

    let file_routes = Router::new()
        .route("/", get(list_files))
        .route("/upload", post(upload_file))
        .route("/create", post(create_file))
        .route("/trash", get(list_trash).delete(empty_trash))
        .route("/trash/:id", delete(delete_permanently))
        .route("/trash/:id/restore", post(restore_file))
        .route("/:id", get(get_file).delete(delete_file))
        .route("/:id/view", get(view_file))
        .route("/:id/download", get(download_file))
        .route("/:id/rename", put(rename_file))
        .route("/:id/move", put(move_file))
        .route("/:id/visibility", put(set_visibility));

    let comment_routes = Router::new()
        .route("/:file_id", get(list_comments).post(add_comment))
        .route("/:file_id/:comment_id", delete(delete_comment));

    let admin_routes = Router::new()
        .route("/dashboard", get(admin_dashboard))
        .route("/users", get(admin_list_users))
        .route("/users/:id", delete(admin_delete_user))
        .route("/files", get(admin_list_files))
        .route("/files/:id", delete(admin_delete_file))
        .route("/trash", get(admin_list_trash));

    let api_limit = rate_limit_state.clone();
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/profile", profile_routes)
        .nest("/files", file_routes)
        .nest("/comments", comment_routes)
        .nest("/admin", admin_routes)
        .route("/public/files", get(list_public_files))
        .route("/categories", get(list_categories))
        .layer(middleware::from_fn(move |req, next| {
            api_rate_limit(api_limit.clone(), req, next)
        }));

    rate_limit_state.start_cleanup_task();

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(log_failures))
                .layer(middleware::from_fn(security_headers))
                .layer(create_cors_layer(&options.cors_origins))
                .layer(DefaultBodyLimit::max(options.body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_router() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_swagger_document_served() {
        let response = create_swagger_router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
