// Relay server binary: the thin cross-zone hop in front of a remote
// gateway.

use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use teller_mcp::protocol::{CallerContext, CLIENT_CONTEXT_HEADER};
use teller_relay::{Relay, RelayConfig};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Parser, Debug)]
#[command(name = "teller-relay")]
#[command(about = "Teller cross-zone relay", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "teller-relay.toml")]
    config: PathBuf,

    /// Remote gateway invoke endpoint override
    #[arg(long, env = "TELLER_RELAY_TARGET")]
    target: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teller_relay=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = RelayConfig::load(&args.config)?;
    if args.target.is_some() {
        config.forward.target_url = args.target;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let target = config.target_url()?;
    tracing::info!("Starting Teller relay");
    tracing::info!(
        "Forwarding to {} (zone: {})",
        target,
        config.forward.remote_zone.as_deref().unwrap_or("unspecified")
    );

    let relay = Arc::new(Relay::new(&target)?);
    let app = Router::new()
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(relay);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Relay listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Forward one call to the remote gateway.
///
/// A transport failure here is a real failure, answered as 502; the relay
/// has no policy knowledge of a safe fallback.
async fn invoke(
    State(relay): State<Arc<Relay>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let context = headers
        .get(CLIENT_CONTEXT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CallerContext::from_header);

    match relay.forward(&body, context.as_ref()).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "forwarding failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "teller-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
