//! Authentication handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{ensure_available, register as register_user, RegistrationRequest};
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, RegisterRequest, SendCodeRequest, SendCodeResponse,
    UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::CloudboxError;

const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

/// POST /api/auth/send-code - Send a registration verification code.
///
/// When the mail cannot be delivered the code is logged on the server and
/// the request still succeeds.
#[utoipa::path(
    post,
    path = "/auth/send-code",
    tag = "auth",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code issued", body = SendCodeResponse),
        (status = 400, description = "Invalid input or account already exists"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn send_code(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SendCodeRequest>,
) -> Result<Json<ApiResponse<SendCodeResponse>>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim();

    ensure_available(&state.users(), username, &email)
        .await
        .map_err(CloudboxError::from)?;

    let code = state.verification().issue(&email).await?;

    let delivered = match state.mailer.send_verification_code(&email, &code).await {
        Ok(()) => state.mailer.delivers(),
        Err(e) => {
            tracing::warn!(
                email = %email,
                code = %code,
                error = %e,
                "Verification mail could not be delivered"
            );
            false
        }
    };

    let message = if delivered {
        "Verification code sent"
    } else {
        "Verification code issued, but the mail could not be delivered. Contact the administrator."
    };

    Ok(Json(ApiResponse::with_message(
        message,
        SendCodeResponse {
            email,
            expires_in: state.code_ttl_secs,
            delivered,
        },
    )))
}

/// POST /api/auth/register - Register with a verification code.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = UserInfo),
        (status = 400, description = "Invalid input, duplicate account or wrong code")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let request = RegistrationRequest::new(
        req.username,
        req.email,
        req.password,
        req.verification_code,
    )
    .with_confirmation(req.confirm_password);

    let user = register_user(&state.users(), &state.verification(), request)
        .await
        .map_err(CloudboxError::from)?;

    state.storage.ensure_user_dir(user.id).await?;

    Ok(Json(ApiResponse::with_message(
        "Registration complete",
        UserInfo::from(user),
    )))
}

/// POST /api/auth/login - Log in with username or email.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let identifier = req.identifier.trim();

    let user = state
        .users()
        .get_by_email_or_username(identifier)
        .await?
        .ok_or_else(|| {
            tracing::warn!(identifier = %identifier, "Login failed: unknown user");
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    crate::verify_password(&req.password, &user.password).map_err(|_| {
        tracing::warn!(user_id = user.id, "Login failed: wrong password");
        ApiError::unauthorized(INVALID_CREDENTIALS)
    })?;

    let access_token = state.generate_access_token(&user)?;
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::new(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.access_token_expiry,
        user: UserInfo::from(user),
    })))
}

/// POST /api/auth/logout - Log out.
///
/// Tokens are stateless; the client discards its token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out"))
}

/// GET /api/auth/me - Current user.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .users()
        .get_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(Json(ApiResponse::new(UserInfo::from(user))))
}
