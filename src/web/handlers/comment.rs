//! Comment handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::comment::{CommentRepository, CommentWithAuthor};
use crate::file::{FileRecord, FileRepository};
use crate::web::dto::{
    ApiResponse, CommentResponse, CreateCommentRequest, DeletedResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Load a live file for commenting.
///
/// Only a missing file answers 404. Visibility is checked by the caller so
/// that a private file answers 403 to everyone.
async fn load_file(state: &AppState, file_id: i64) -> Result<FileRecord, ApiError> {
    FileRepository::new(state.pool())
        .get_by_id(file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))
}

/// GET /api/comments/:file_id - Comments on a public file, newest first.
#[utoipa::path(
    get,
    path = "/comments/{file_id}",
    tag = "comments",
    params(
        ("file_id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Comments", body = Vec<CommentResponse>),
        (status = 403, description = "File is not public"),
        (status = 404, description = "File not found")
    )
)]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    user: OptionalAuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let file = load_file(&state, file_id).await?;
    if !file.is_public {
        return Err(ApiError::forbidden(
            "Comments are only available on public files",
        ));
    }

    let viewer = user.0.as_ref().map(|c| (c.sub, c.is_admin()));
    let comments = CommentRepository::new(state.pool())
        .list_by_file(file.id)
        .await?
        .into_iter()
        .map(|comment| CommentResponse::new(comment, viewer))
        .collect();

    Ok(Json(ApiResponse::new(comments)))
}

/// POST /api/comments/:file_id - Comment on a public file.
#[utoipa::path(
    post,
    path = "/comments/{file_id}",
    tag = "comments",
    params(
        ("file_id" = i64, Path, description = "File ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Empty or too long comment"),
        (status = 403, description = "File is not public"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    let file = load_file(&state, file_id).await?;
    let repo = CommentRepository::new(state.pool());
    let comment = repo.add(&file, claims.sub, &req.content).await?;

    let response = CommentResponse::new(
        CommentWithAuthor {
            id: comment.id,
            file_id: comment.file_id,
            author_id: comment.author_id,
            author_name: claims.username.clone(),
            content: comment.content,
            created_at: comment.created_at,
        },
        Some((claims.sub, claims.is_admin())),
    );

    Ok(Json(ApiResponse::with_message("Comment added", response)))
}

/// DELETE /api/comments/:file_id/:comment_id - Delete a comment.
///
/// Answers `deleted: false` when the comment does not exist, belongs to
/// another file, or the caller is neither its author nor an admin.
#[utoipa::path(
    delete,
    path = "/comments/{file_id}/{comment_id}",
    tag = "comments",
    params(
        ("file_id" = i64, Path, description = "File ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Deletion outcome", body = DeletedResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path((file_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let repo = CommentRepository::new(state.pool());

    let deleted = match repo.get_by_id(comment_id).await? {
        Some(comment) if comment.file_id == file_id => {
            repo.delete(comment_id, claims.sub, claims.is_admin())
                .await?
        }
        _ => false,
    };

    if deleted {
        tracing::info!(comment_id, file_id, user_id = claims.sub, "Comment deleted");
    }

    let message = if deleted {
        "Comment deleted"
    } else {
        "Comment not deleted"
    };
    Ok(Json(ApiResponse::with_message(
        message,
        DeletedResponse { deleted },
    )))
}
