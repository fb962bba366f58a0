//! Profile handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{
    change_password as update_password, change_username as update_username,
    get_profile as load_profile,
};
use crate::web::dto::{
    ApiResponse, ChangePasswordRequest, ChangeUsernameRequest, UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;
use crate::CloudboxError;

/// GET /api/profile - Current user's profile.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile", body = UserInfo),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let profile = load_profile(&state.users(), claims.sub)
        .await
        .map_err(CloudboxError::from)?;

    Ok(Json(ApiResponse::new(UserInfo::from(profile))))
}

/// POST /api/profile/username - Change username.
///
/// Tokens issued before the change keep the old name in their claims; the
/// client should log in again.
#[utoipa::path(
    post,
    path = "/profile/username",
    tag = "profile",
    request_body = ChangeUsernameRequest,
    responses(
        (status = 200, description = "Username changed", body = UserInfo),
        (status = 400, description = "Invalid name, taken name or wrong password"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_username(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangeUsernameRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = update_username(&state.users(), claims.sub, &req.new_username, &req.password)
        .await
        .map_err(CloudboxError::from)?;

    Ok(Json(ApiResponse::with_message(
        "Username changed",
        UserInfo::from(user),
    )))
}

/// POST /api/profile/password - Change password.
#[utoipa::path(
    post,
    path = "/profile/password",
    tag = "profile",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Wrong current password or invalid new password"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    update_password(
        &state.users(),
        claims.sub,
        &req.current_password,
        &req.new_password,
        &req.confirm_password,
    )
    .await
    .map_err(CloudboxError::from)?;

    Ok(Json(ApiResponse::message("Password changed")))
}
