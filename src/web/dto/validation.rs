//! Request body validation.
//!
//! [`ValidatedJson`] runs the `validator` derives of a DTO before the handler
//! sees it. The field validators below wrap the domain rules so a bad
//! filename or code is reported per field instead of as a bare message.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::auth::verification::CODE_LENGTH;
use crate::file::validate_filename;
use crate::web::error::ApiError;
use crate::CloudboxError;

/// JSON body that has passed its `validator` rules.
///
/// ```ignore
/// async fn add_comment(
///     ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
/// ) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
///     // req.content is non-blank and at most 1000 characters
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
            })?;

        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(ValidatedJson(value))
    }
}

fn invalid(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    ValidationError::new(code).with_message(message.into())
}

/// Single-line text: no control characters at all.
pub fn single_line(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(invalid("single_line", "Must not contain control characters"));
    }
    Ok(())
}

/// Not blank once surrounding whitespace is removed.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("not_empty_trimmed", "Must not be empty"));
    }
    Ok(())
}

/// A registration code: exactly six ASCII digits.
pub fn verification_code(value: &str) -> Result<(), ValidationError> {
    let code = value.trim();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            "verification_code",
            format!("Verification code must be {CODE_LENGTH} digits"),
        ));
    }
    Ok(())
}

/// A display filename accepted by the upload rules.
pub fn legal_filename(value: &str) -> Result<(), ValidationError> {
    match validate_filename(value) {
        Ok(_) => Ok(()),
        Err(CloudboxError::Validation(message)) => Err(invalid("filename", message)),
        Err(e) => Err(invalid("filename", e.to_string())),
    }
}
