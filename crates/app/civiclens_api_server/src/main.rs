//! CivicLens API server binary.
//!
//! Serves the chat proxy and ZIP resolver, holding the upstream credential
//! on behalf of browser and mobile clients.

use std::sync::Arc;

use civiclens_api::config::ApiConfig;
use civiclens_core::config::API_KEY_VAR;
use civiclens_core::gateway::HttpGateway;
use clap::Parser;
use tracing::{error, info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "civiclens_api_server", about = "CivicLens API server")]
struct Args {
    /// Address to listen on (default 127.0.0.1:3100).
    #[arg(long, env = "BIND_ADDR")]
    bind_addr: Option<String>,

    /// Port to listen on (0 = ephemeral); combined with the host of the bind address.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,civiclens_api=debug,civiclens_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env(args.bind_addr)?;
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }

    if !config.gateway.has_credential() {
        warn!("{API_KEY_VAR} is not set; model-backed endpoints will answer 500");
    }
    info!(
        model = %config.gateway.model,
        upstream = %config.gateway.base_url,
        history_window = config.gateway.history_window,
        "configured upstream"
    );

    let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
    let state = civiclens_api::AppState {
        config: config.clone(),
        gateway,
    };
    let app = civiclens_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Replaces the port of `addr`, keeping its host.
fn with_port(addr: &str, port: u16) -> String {
    let host = addr.rsplit_once(':').map_or("127.0.0.1", |(host, _)| host);
    format!("{host}:{port}")
}

/// Resolves on ctrl-c. If the handler cannot be installed the server keeps
/// running until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!("failed to listen for ctrl-c, graceful shutdown disabled: {e}");
            std::future::pending::<()>().await;
        }
    }
}
