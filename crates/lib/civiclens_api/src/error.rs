//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use civiclens_core::conversation::NormalizeError;
use civiclens_core::districts::ZipError;
use serde::Serialize;
use thiserror::Error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON body returned for every [`AppError`].
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing prompt")]
    MissingPrompt,

    #[error("Invalid ZIP: {0}")]
    InvalidZip(#[from] ZipError),

    /// Upstream credential not configured. Carries the error code the
    /// endpoint reports.
    #[error("Missing credential ({0})")]
    MissingCredential(&'static str),

    #[error("POST only")]
    MethodNotAllowed,

    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::MissingPrompt => (StatusCode::BAD_REQUEST, "Missing prompt", None),
            AppError::InvalidZip(e) => (StatusCode::BAD_REQUEST, "invalid_zip", Some(e.to_string())),
            AppError::MissingCredential(code) => (StatusCode::INTERNAL_SERVER_ERROR, *code, None),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "POST only", None),
            AppError::Upstream(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_failed",
                Some(m.clone()),
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<NormalizeError> for AppError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::EmptyPrompt => AppError::MissingPrompt,
        }
    }
}
