use crate::services::auth::AuthError;
use crate::services::resource_service::ResourceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        let status = match &err {
            ResourceError::NotFound(_) => StatusCode::NOT_FOUND,
            ResourceError::NotOwner => StatusCode::FORBIDDEN,
            ResourceError::MissingFile
            | ResourceError::DisallowedFileType(_)
            | ResourceError::FileTooLarge(_)
            | ResourceError::Validation(_) => StatusCode::BAD_REQUEST,
            ResourceError::UploadFailed(_)
            | ResourceError::Storage(_)
            | ResourceError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        AppError::new(status, err.to_string())
    }
}
