//! # civiclens_api
//!
//! HTTP API library for CivicLens.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use axum::routing::{MethodRouter, get, post};
use civiclens_core::gateway::ChatGateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{chat, districts, health};

/// Route paths served by [`router`].
pub mod routes {
    pub const POST_CHAT: &str = "/api/perplexity";
    pub const POST_CHAT_ALIAS: &str = "/chat";
    pub const POST_ZIP_RESOLVE: &str = "/api/zip/resolve";
    pub const GET_HEALTH: &str = "/api/health";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Upstream chat-completion client.
    pub gateway: Arc<dyn ChatGateway>,
}

/// POST handler plus empty-200 `OPTIONS` and a 405 for everything else.
fn post_endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: axum::handler::Handler<T, AppState>,
    T: 'static,
{
    post(handler)
        .options(handlers::preflight)
        .fallback(handlers::post_only)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            ORIGIN,
            CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route(routes::POST_CHAT, post_endpoint(chat::chat_handler))
        .route(routes::POST_CHAT_ALIAS, post_endpoint(chat::chat_handler))
        .route(routes::POST_ZIP_RESOLVE, post_endpoint(districts::resolve_handler))
        .route(routes::GET_HEALTH, get(health::health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
