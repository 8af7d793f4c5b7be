// @zen-component: CHAT-ModelGateway
//
//! Model gateway — the single point where CivicLens talks to the
//! chat-completion API.
//!
//! The [`ChatGateway`] trait is what handlers depend on; [`HttpGateway`] is
//! the production implementation. Errors embedded in a syntactically valid
//! response body are not gateway errors: they come back inside
//! [`ModelResponse`] for the caller to interpret.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::conversation::MessageSequence;

/// Errors that prevent a usable response envelope from being obtained.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing PPLX_API_KEY")]
    MissingCredential,

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream response was not JSON: {0}")]
    Decode(String),
}

/// Body of a chat-completion call.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub messages: MessageSequence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelRequest {
    /// Conversational request using the configured sampling parameters.
    pub fn chat(config: &GatewayConfig, messages: MessageSequence) -> Self {
        Self {
            model: config.model.clone(),
            messages,
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        }
    }

    /// Structured-output request; sampling is left to the upstream defaults.
    pub fn structured(config: &GatewayConfig, messages: MessageSequence) -> Self {
        Self {
            model: config.model.clone(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Decoded upstream envelope together with the HTTP status it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub status: u16,
    pub body: Value,
}

impl ModelResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Top-level `error` object, if the upstream reported one.
    pub fn error(&self) -> Option<&Value> {
        self.body.get("error").filter(|e| !e.is_null())
    }

    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the chat-completion API.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Performs one round trip. No retries.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, GatewayError>;

    /// Whether calls can be made at all (a credential is configured).
    fn is_configured(&self) -> bool;
}
