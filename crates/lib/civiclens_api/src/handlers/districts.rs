// @zen-component: ZIP-ResolveHandler
//
//! ZIP → district resolution handler.

use axum::Json;
use axum::extract::State;
use civiclens_core::districts::{self, ZipCode, ZipError};
use civiclens_core::outcome::Outcome;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::LenientJson;

/// Error code reported when no upstream credential is configured.
const MISSING_CREDENTIAL: &str = "missing_api_key";

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub zip: Value,
}

/// `POST /api/zip/resolve` — best-effort district lookup for a ZIP code.
///
/// A reply the model formatted badly is still a 200, with
/// `{"error": "ai_parse_failed", "raw": ...}` so the client can show it.
pub async fn resolve_handler(
    State(state): State<AppState>,
    LenientJson(body): LenientJson<ResolveRequest>,
) -> AppResult<Json<Value>> {
    let zip = body
        .zip
        .as_str()
        .ok_or(ZipError::Invalid)
        .and_then(ZipCode::parse)?;

    if !state.gateway.is_configured() {
        return Err(AppError::MissingCredential(MISSING_CREDENTIAL));
    }

    match districts::resolve(state.gateway.as_ref(), &state.config.gateway, &zip).await {
        Outcome::Success(result) => Ok(Json(result.into_value())),
        Outcome::SoftFailure { diagnostics, .. } => Ok(Json(json!({
            "error": "ai_parse_failed",
            "raw": diagnostics,
        }))),
        Outcome::HardFailure { diagnostics, .. } => Err(AppError::Upstream(
            diagnostics
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("upstream request failed")
                .to_string(),
        )),
    }
}
