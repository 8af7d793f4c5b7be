//! Health endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub credential_configured: bool,
}

/// `GET /api/health` — liveness plus whether model calls can succeed.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: civiclens_core::version(),
        credential_configured: state.gateway.is_configured(),
    })
}
