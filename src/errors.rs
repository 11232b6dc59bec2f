use crate::{
    services::{images::UploadError, model::ModelError},
    views,
};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

/// The single error type handlers return.
///
/// Collaborator errors are converted into a status plus the human-readable
/// message shown on the generic error page.
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

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
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
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        } else {
            tracing::warn!(status = self.status.as_u16(), "{}", self.message);
        }

        let body = Html(views::error_page(self.status, &self.message));
        (self.status, body).into_response()
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let status = match &err {
            ModelError::NotFound(_) => StatusCode::NOT_FOUND,
            ModelError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ModelError::InvalidPageToken(_) => StatusCode::BAD_REQUEST,
            ModelError::Sqlx(_) | ModelError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let status = match &err {
            UploadError::UnsupportedType(_) | UploadError::InvalidKey => StatusCode::BAD_REQUEST,
            UploadError::NotFound(_) => StatusCode::NOT_FOUND,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_keep_their_kind() {
        let err = AppError::from(ModelError::NotFound("42".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "camera `42` not found");

        let err = AppError::from(ModelError::Unavailable("pool closed".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upload_errors_map_to_client_or_server_status() {
        let err = AppError::from(UploadError::UnsupportedType("text/plain".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(
            AppError::from(UploadError::Io(io)).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn renders_html_error_page() {
        let response = AppError::not_found("camera `1` not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
