//! OpenAPI document for the cloudbox API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::file::Category;
use crate::web::dto::{
    AdminUserResponse, CategoryCount, CategoryResponse, ChangePasswordRequest,
    ChangeUsernameRequest, CommentResponse, CountResponse, CreateCommentRequest,
    CreateFileRequest, DashboardResponse, DeletedResponse, FileContentResponse, FileListResponse,
    FileResponse, LoginRequest, LoginResponse, MoveFileRequest, RegisterRequest,
    RenameFileRequest, SendCodeRequest, SendCodeResponse, TrashEntryResponse, UsageResponse,
    UserInfo, VisibilityRequest,
};
use crate::web::error::{ErrorBody, ErrorCode, ErrorDetail};
use crate::web::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        handlers::auth::send_code,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        // Profile
        handlers::profile::get_profile,
        handlers::profile::change_username,
        handlers::profile::change_password,
        // Files
        handlers::file::list_files,
        handlers::file::upload_file,
        handlers::file::create_file,
        handlers::file::get_file,
        handlers::file::view_file,
        handlers::file::download_file,
        handlers::file::rename_file,
        handlers::file::move_file,
        handlers::file::set_visibility,
        handlers::file::delete_file,
        handlers::file::list_public_files,
        handlers::file::list_categories,
        // Trash
        handlers::trash::list_trash,
        handlers::trash::restore_file,
        handlers::trash::delete_permanently,
        handlers::trash::empty_trash,
        // Comments
        handlers::comment::list_comments,
        handlers::comment::add_comment,
        handlers::comment::delete_comment,
        // Admin
        handlers::admin::admin_dashboard,
        handlers::admin::admin_list_users,
        handlers::admin::admin_delete_user,
        handlers::admin::admin_list_files,
        handlers::admin::admin_delete_file,
        handlers::admin::admin_list_trash,
    ),
    components(schemas(
        Category,
        ErrorBody,
        ErrorCode,
        ErrorDetail,
        SendCodeRequest,
        SendCodeResponse,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserInfo,
        ChangeUsernameRequest,
        ChangePasswordRequest,
        CreateFileRequest,
        RenameFileRequest,
        MoveFileRequest,
        VisibilityRequest,
        FileResponse,
        FileListResponse,
        FileContentResponse,
        UsageResponse,
        CategoryCount,
        CategoryResponse,
        TrashEntryResponse,
        CountResponse,
        CreateCommentRequest,
        CommentResponse,
        DeletedResponse,
        DashboardResponse,
        AdminUserResponse,
    )),
    tags(
        (name = "auth", description = "Registration, verification codes and login"),
        (name = "profile", description = "Own account settings"),
        (name = "files", description = "Upload, browse and manage files"),
        (name = "trash", description = "Recycle bin"),
        (name = "comments", description = "Comments on public files"),
        (name = "admin", description = "Administration (admin only)"),
    ),
    modifiers(&SecurityAddon),
    servers(
        (url = "/api")
    ),
    info(
        title = "cloudbox API",
        description = "Personal cloud storage",
    )
)]
pub struct ApiDoc;

/// Adds the Bearer JWT security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/files/{id}"]["get"].is_object());
        assert!(json["paths"]["/files/trash"]["delete"].is_object());
        assert!(json["paths"]["/admin/dashboard"]["get"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
        assert!(json["components"]["schemas"]["FileResponse"].is_object());
    }
}
