//! Admin handlers for Web API.

use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::require_admin;
use crate::comment::CommentRepository;
use crate::file::{FileRepository, TrashRepository};
use crate::web::dto::{
    AdminUserResponse, ApiResponse, DashboardResponse, FileResponse, TrashEntryResponse, UserInfo,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, JwtClaims};

fn ensure_admin(claims: &JwtClaims) -> Result<(), ApiError> {
    require_admin(&claims.actor()).map_err(|e| {
        tracing::warn!(user_id = claims.sub, "Admin endpoint refused");
        ApiError::from(e)
    })
}

/// GET /api/admin/dashboard - Site totals.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    responses(
        (status = 200, description = "Site totals", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    ensure_admin(&claims)?;

    let files = FileRepository::new(state.pool());
    let total_files = files.count().await?;
    let public_files = files.count_public().await?;

    Ok(Json(ApiResponse::new(DashboardResponse {
        users: state.users().count().await?,
        files: total_files,
        public_files,
        private_files: total_files - public_files,
        comments: CommentRepository::new(state.pool()).count().await?,
        trash: TrashRepository::new(state.pool()).count().await?,
    })))
}

// ============================================================================
// User Management
// ============================================================================

/// GET /api/admin/users - List all users with their usage.
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "All users", body = Vec<AdminUserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<AdminUserResponse>>>, ApiError> {
    ensure_admin(&claims)?;

    let files = FileRepository::new(state.pool());
    let mut users = Vec::new();
    for user in state.users().list_all().await? {
        let file_count = files.count_by_owner(user.id).await?;
        let storage_used = files.storage_used(user.id).await?;
        users.push(AdminUserResponse {
            user: UserInfo::from(user),
            file_count,
            storage_used,
        });
    }

    Ok(Json(ApiResponse::new(users)))
}

/// DELETE /api/admin/users/:id - Delete a user.
///
/// Administrators cannot be deleted, including oneself. A user who still
/// owns live or trashed files cannot be deleted; their comments go with
/// the account.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "User still owns files"),
        (status = 403, description = "Admin access required or target is an admin"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ensure_admin(&claims)?;

    if user_id == claims.sub {
        return Err(ApiError::forbidden("You cannot delete your own account"));
    }

    let users = state.users();
    let user = users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if user.is_admin {
        return Err(ApiError::forbidden("Administrator accounts cannot be deleted"));
    }

    let live = FileRepository::new(state.pool())
        .count_by_owner(user_id)
        .await?;
    let trashed = TrashRepository::new(state.pool())
        .count_by_owner(user_id)
        .await?;
    if live + trashed > 0 {
        return Err(ApiError::conflict(format!(
            "User still owns {live} file(s) and {trashed} trashed file(s)"
        )));
    }

    if !users.delete(user_id).await? {
        return Err(ApiError::not_found("user not found"));
    }

    tracing::info!(
        user_id,
        username = %user.username,
        admin_id = claims.sub,
        "User deleted by admin"
    );

    Ok(Json(ApiResponse::message("User deleted")))
}

// ============================================================================
// File Management
// ============================================================================

/// GET /api/admin/files - Every live file.
#[utoipa::path(
    get,
    path = "/admin/files",
    tag = "admin",
    responses(
        (status = 200, description = "All files", body = Vec<FileResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    ensure_admin(&claims)?;

    let names: HashMap<i64, String> = state
        .users()
        .list_all()
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let files = FileRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .map(|file| {
            let owner = names.get(&file.owner_id).cloned().unwrap_or_default();
            FileResponse::from(file).with_owner(owner)
        })
        .collect();

    Ok(Json(ApiResponse::new(files)))
}

/// DELETE /api/admin/files/:id - Move any file to its owner's trash.
#[utoipa::path(
    delete,
    path = "/admin/files/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File moved to trash", body = TrashEntryResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<TrashEntryResponse>>, ApiError> {
    ensure_admin(&claims)?;

    let entry = state.files().trash(file_id, &claims.actor()).await?;
    tracing::info!(
        file_id,
        owner_id = entry.owner_id,
        admin_id = claims.sub,
        "File moved to trash by admin"
    );

    Ok(Json(ApiResponse::with_message(
        "File moved to trash",
        TrashEntryResponse::from(entry),
    )))
}

/// GET /api/admin/trash - Every trash entry across users.
#[utoipa::path(
    get,
    path = "/admin/trash",
    tag = "admin",
    responses(
        (status = 200, description = "All trash entries", body = Vec<TrashEntryResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_trash(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<TrashEntryResponse>>>, ApiError> {
    ensure_admin(&claims)?;

    let entries = TrashRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .map(TrashEntryResponse::from)
        .collect();

    Ok(Json(ApiResponse::new(entries)))
}
