//! reqwest-backed gateway.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ChatGateway, GatewayError, ModelRequest, ModelResponse};
use crate::config::GatewayConfig;

/// Calls `<base_url>/chat/completions` with a bearer credential.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    api_key: Option<String>,
    url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            url: config.completions_url(),
        })
    }
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingCredential)?;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "calling chat completion"
        );

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("upstream request failed: {e}");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to read response body: {e}")))?;

        let body = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(status, "upstream returned a non-JSON body");
            GatewayError::Decode(e.to_string())
        })?;

        debug!(status, "chat completion returned");
        Ok(ModelResponse::new(status, body))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
