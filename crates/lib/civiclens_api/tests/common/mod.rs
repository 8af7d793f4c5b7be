//! Shared fixtures for router integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use civiclens_api::{AppState, config::ApiConfig};
use civiclens_core::config::GatewayConfig;
use civiclens_core::gateway::{ChatGateway, GatewayError, ModelRequest, ModelResponse};
use serde_json::Value;
use tower::ServiceExt;

/// What the stub answers with.
#[derive(Clone)]
pub enum Reply {
    Json(u16, Value),
    TransportError(String),
}

/// Records requests and answers with a fixed reply.
pub struct StubGateway {
    configured: bool,
    reply: Reply,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl StubGateway {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            reply: Reply::TransportError("should not be called".into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ModelRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("gateway was called")
    }
}

#[async_trait]
impl ChatGateway for StubGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Json(status, body) => Ok(ModelResponse::new(*status, body.clone())),
            Reply::TransportError(msg) => Err(GatewayError::Transport(msg.clone())),
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

pub fn app(gateway: Arc<StubGateway>) -> Router {
    let state = AppState {
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            gateway: GatewayConfig {
                api_key: Some("test-key".into()),
                ..GatewayConfig::default()
            },
        },
        gateway,
    };
    civiclens_api::router(state)
}

pub fn content(text: &str) -> Value {
    serde_json::json!({"choices": [{"message": {"content": text}}]})
}

/// Sends a request and returns the status plus the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}
