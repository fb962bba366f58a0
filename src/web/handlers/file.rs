//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::file::{Category, CreateTextRequest, UploadRequest};
use crate::web::dto::{
    ApiResponse, CategoryResponse, CreateFileRequest, FileContentResponse, FileListResponse,
    FileResponse, MoveFileRequest, RenameFileRequest, TrashEntryResponse, UsageResponse,
    ValidatedJson, VisibilityRequest,
};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Map a multipart read failure, reporting an oversized body as 413.
fn multipart_error(state: &AppState, e: MultipartError, fallback: String) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected by request size limit: {}", e);
        return ApiError::with_details(
            ErrorCode::PayloadTooLarge,
            "Upload exceeds the maximum request size",
            serde_json::json!({ "quota": state.policy.quota_bytes() }),
        );
    }
    tracing::warn!("{}: {}", fallback, e);
    ApiError::bad_request(fallback)
}

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped and quotes and backslashes replaced in
/// the plain `filename` parameter; names that needed this, or that are not
/// ASCII, also get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// Parse a multipart checkbox-style flag.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

/// GET /api/files - The caller's files and storage usage.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Own files with usage summary", body = FileListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<FileListResponse>>, ApiError> {
    let service = state.files();
    let files = service.list_own(claims.sub).await?;
    let usage = service.usage(claims.sub).await?;

    Ok(Json(ApiResponse::new(FileListResponse {
        files: files.into_iter().map(FileResponse::from).collect(),
        usage: UsageResponse::from(usage),
    })))
}

/// POST /api/files/upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field and optional
/// "is_public", "description" and "category" fields.
#[utoipa::path(
    post,
    path = "/files/upload",
    tag = "files",
    responses(
        (status = 200, description = "File uploaded", body = FileResponse),
        (status = 400, description = "Invalid file, extension not allowed or quota exceeded"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Request body over the upload size limit")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let mut upload: Option<UploadRequest> = None;
    let mut is_public = false;
    let mut description: Option<String> = None;
    let mut category: Option<Category> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, e, "Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("Uploaded file has no name"))?;
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(&state, e, "Failed to read file".to_string()))?;
                upload = Some(UploadRequest::new(filename, content.to_vec()));
            }
            "is_public" | "description" | "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&state, e, format!("Invalid {name}")))?;
                match name.as_str() {
                    "is_public" => is_public = parse_flag(&value),
                    "description" => description = Some(value),
                    _ if value.trim().is_empty() => {}
                    _ => {
                        category = Some(Category::parse(&value).ok_or_else(|| {
                            ApiError::invalid(format!("Unknown category: {}", value.trim()))
                        })?)
                    }
                }
            }
            _ => {}
        }
    }

    let mut request = upload
        .ok_or_else(|| ApiError::bad_request("No file provided"))?
        .with_public(is_public);
    if let Some(description) = description {
        request = request.with_description(description);
    }
    if let Some(category) = category {
        request = request.with_category(category);
    }

    let file = state.files().upload(claims.sub, request).await?;

    Ok(Json(ApiResponse::with_message(
        "File uploaded",
        FileResponse::from(file),
    )))
}

/// POST /api/files/create - Create a text file from the browser.
#[utoipa::path(
    post,
    path = "/files/create",
    tag = "files",
    request_body = CreateFileRequest,
    responses(
        (status = 200, description = "File created", body = FileResponse),
        (status = 400, description = "Invalid name, extension not allowed or quota exceeded"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let request = CreateTextRequest {
        filename: req.filename,
        content: req.content,
        is_public: req.is_public,
        description: req.description,
        category: req.category,
    };

    let file = state.files().create_text(claims.sub, request).await?;

    Ok(Json(ApiResponse::with_message(
        "File created",
        FileResponse::from(file),
    )))
}

/// GET /api/files/:id - File metadata.
///
/// Public files are readable without logging in.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    user: OptionalAuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state.files().get(file_id, &user.actor()).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// GET /api/files/:id/view - Decoded file content.
///
/// Text is decoded with the detected encoding; images are reported as such
/// and not decoded.
#[utoipa::path(
    get,
    path = "/files/{id}/view",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", body = FileContentResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    user: OptionalAuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileContentResponse>>, ApiError> {
    let (file, content) = state.files().view(file_id, &user.actor()).await?;
    Ok(Json(ApiResponse::new(FileContentResponse::new(file, content))))
}

/// GET /api/files/:id/download - Download file bytes.
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    user: OptionalAuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let (file, content) = state.files().download(file_id, &user.actor()).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &file.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.original_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// PUT /api/files/:id/rename - Rename a file.
#[utoipa::path(
    put,
    path = "/files/{id}/rename",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = RenameFileRequest,
    responses(
        (status = 200, description = "File renamed", body = FileResponse),
        (status = 400, description = "Invalid file name"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .files()
        .rename(file_id, &claims.actor(), &req.new_name)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "File renamed",
        FileResponse::from(file),
    )))
}

/// PUT /api/files/:id/move - Change a file's category.
#[utoipa::path(
    put,
    path = "/files/{id}/move",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = MoveFileRequest,
    responses(
        (status = 200, description = "File moved", body = FileResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    Json(req): Json<MoveFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .files()
        .move_to_category(file_id, &claims.actor(), req.category)
        .await?;
    Ok(Json(ApiResponse::with_message(
        format!("File moved to {}", file.category.label()),
        FileResponse::from(file),
    )))
}

/// PUT /api/files/:id/visibility - Make a file public or private.
#[utoipa::path(
    put,
    path = "/files/{id}/visibility",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility changed", body = FileResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = state
        .files()
        .set_visibility(file_id, &claims.actor(), req.is_public)
        .await?;
    let message = if file.is_public {
        "File is now public"
    } else {
        "File is now private"
    };
    Ok(Json(ApiResponse::with_message(
        message,
        FileResponse::from(file),
    )))
}

/// DELETE /api/files/:id - Move a file to the trash.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File moved to trash", body = TrashEntryResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<TrashEntryResponse>>, ApiError> {
    let entry = state.files().trash(file_id, &claims.actor()).await?;
    Ok(Json(ApiResponse::with_message(
        "File moved to trash",
        TrashEntryResponse::from(entry),
    )))
}

/// GET /api/public/files - Public files of every user.
#[utoipa::path(
    get,
    path = "/public/files",
    tag = "files",
    responses(
        (status = 200, description = "Public files", body = Vec<FileResponse>)
    )
)]
pub async fn list_public_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state.files().list_public().await?;
    let names: HashMap<i64, String> = state
        .users()
        .list_all()
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let files = files
        .into_iter()
        .map(|file| {
            let owner = names.get(&file.owner_id).cloned().unwrap_or_default();
            FileResponse::from(file).with_owner(owner)
        })
        .collect();

    Ok(Json(ApiResponse::new(files)))
}

/// GET /api/categories - The fixed list of file categories.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "files",
    responses(
        (status = 200, description = "Categories", body = Vec<CategoryResponse>)
    )
)]
pub async fn list_categories() -> Json<ApiResponse<Vec<CategoryResponse>>> {
    Json(ApiResponse::new(
        Category::ALL
            .iter()
            .copied()
            .map(CategoryResponse::from)
            .collect(),
    ))
}
