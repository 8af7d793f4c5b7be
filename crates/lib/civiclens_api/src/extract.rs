//! Lenient JSON body extraction.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Like `axum::Json`, but never rejects.
///
/// Clients send raw or half-formed bodies; anything that is not a JSON
/// object matching `T` is treated as `T::default()` so the handler's own
/// validation decides what to report.
#[derive(Debug, Clone, Default)]
pub struct LenientJson<T>(pub T);

impl<S, T> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("unreadable request body: {e}");
                return Ok(Self(T::default()));
            }
        };
        Ok(Self(parse_lenient(&bytes)))
    }
}

/// Decodes `bytes` as a JSON object into `T`, falling back to the default.
pub fn parse_lenient<T: DeserializeOwned + Default>(bytes: &[u8]) -> T {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|e| {
            debug!("request body did not match expected shape: {e}");
            T::default()
        }),
        Ok(_) => T::default(),
        Err(e) => {
            if !bytes.is_empty() {
                debug!("request body is not JSON: {e}");
            }
            T::default()
        }
    }
}
