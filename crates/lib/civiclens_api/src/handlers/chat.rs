// @zen-component: CHAT-ChatHandler
//
//! Chat proxy handler.
//!
//! Validate → normalize → invoke → sanitize → respond. Every response that
//! gets past validation carries an `answer` the client can display.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use civiclens_core::conversation;
use civiclens_core::gateway::{GatewayError, ModelRequest};
use civiclens_core::outcome::Outcome;
use civiclens_core::sanitizer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::LenientJson;

/// Error code reported when no upstream credential is configured.
const MISSING_CREDENTIAL: &str = "Missing PPLX_API_KEY";

/// Incoming chat body. Fields stay untyped so a wrong type on one field
/// does not discard the others.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Value,
    #[serde(default)]
    pub history: Value,
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

/// Maps an answer outcome to the status and body the client receives.
fn respond(outcome: Outcome<String>) -> (StatusCode, Json<ChatResponse>) {
    let answer = outcome.display_text().to_string();
    if !outcome.is_success() {
        debug!("answering with placeholder");
    }
    let (status, debug) = match outcome {
        Outcome::Success(_) => (StatusCode::OK, None),
        Outcome::SoftFailure { diagnostics, .. } => (StatusCode::OK, Some(diagnostics)),
        Outcome::HardFailure { diagnostics, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, Some(diagnostics))
        }
    };
    (status, Json(ChatResponse { answer, debug }))
}

/// `POST /api/perplexity` — answer a prompt in the context of the client's
/// conversation history.
pub async fn chat_handler(
    State(state): State<AppState>,
    LenientJson(body): LenientJson<ChatRequest>,
) -> AppResult<(StatusCode, Json<ChatResponse>)> {
    let prompt = body
        .prompt
        .as_str()
        .filter(|p| !p.trim().is_empty())
        .ok_or(AppError::MissingPrompt)?;

    if !state.gateway.is_configured() {
        warn!("chat request refused: no upstream credential configured");
        return Err(AppError::MissingCredential(MISSING_CREDENTIAL));
    }

    let gateway_config = &state.config.gateway;
    let messages = conversation::normalize(
        prompt,
        &body.history,
        body.context.as_str(),
        gateway_config.history_window,
    )?;
    debug!(messages = messages.len(), "conversation normalized");

    let request = ModelRequest::chat(gateway_config, messages);
    let outcome = match state.gateway.complete(&request).await {
        Ok(response) => {
            if !response.is_success_status() || response.error().is_some() {
                info!(status = response.status, "upstream declined the chat request");
            }
            sanitizer::answer_from(&response)
        }
        Err(GatewayError::MissingCredential) => {
            return Err(AppError::MissingCredential(MISSING_CREDENTIAL));
        }
        Err(e) => {
            warn!("chat upstream call failed: {e}");
            Outcome::hard(json!({ "error": e.to_string() }))
        }
    };

    Ok(respond(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_answer_without_debug() {
        let (status, Json(body)) = respond(Outcome::Success("Hi".into()));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.answer, "Hi");
        assert!(body.debug.is_none());
    }

    #[test]
    fn failures_show_placeholder_with_diagnostics() {
        let (status, Json(body)) = respond(Outcome::soft(json!({"error": "empty"})));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.answer, "No response.");
        assert_eq!(body.debug, Some(json!({"error": "empty"})));

        let (status, Json(body)) = respond(Outcome::hard(json!({"error": "refused"})));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.answer, "No response.");
    }
}
