//! Request handlers.

pub mod chat;
pub mod districts;
pub mod health;

use axum::http::StatusCode;

use crate::error::AppError;

/// `OPTIONS` on a POST endpoint — empty 200 for cross-origin callers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on a POST endpoint.
pub async fn post_only() -> AppError {
    AppError::MethodNotAllowed
}
