//! Recycle bin handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, CountResponse, FileResponse, TrashEntryResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/files/trash - The caller's trashed files.
#[utoipa::path(
    get,
    path = "/files/trash",
    tag = "trash",
    responses(
        (status = 200, description = "Trashed files", body = Vec<TrashEntryResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_trash(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<TrashEntryResponse>>>, ApiError> {
    let entries = state.files().list_trash(claims.sub).await?;
    Ok(Json(ApiResponse::new(
        entries.into_iter().map(TrashEntryResponse::from).collect(),
    )))
}

/// POST /api/files/trash/:id/restore - Put a trashed file back.
#[utoipa::path(
    post,
    path = "/files/trash/{id}/restore",
    tag = "trash",
    params(
        ("id" = i64, Path, description = "Trash entry ID")
    ),
    responses(
        (status = 200, description = "File restored", body = FileResponse),
        (status = 404, description = "Trash entry not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn restore_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(trash_id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state.files().restore(trash_id, &claims.actor()).await?;
    Ok(Json(ApiResponse::with_message(
        "File restored",
        FileResponse::from(file),
    )))
}

/// DELETE /api/files/trash/:id - Delete a trashed file for good.
#[utoipa::path(
    delete,
    path = "/files/trash/{id}",
    tag = "trash",
    params(
        ("id" = i64, Path, description = "Trash entry ID")
    ),
    responses(
        (status = 200, description = "File permanently deleted"),
        (status = 404, description = "Trash entry not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_permanently(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(trash_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .files()
        .permanent_delete(trash_id, &claims.actor())
        .await?;
    Ok(Json(ApiResponse::message("File permanently deleted")))
}

/// DELETE /api/files/trash - Empty the caller's trash.
#[utoipa::path(
    delete,
    path = "/files/trash",
    tag = "trash",
    responses(
        (status = 200, description = "Trash emptied", body = CountResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.files().empty_trash(claims.sub).await?;
    Ok(Json(ApiResponse::with_message(
        format!("{count} file(s) deleted"),
        CountResponse { count },
    )))
}
