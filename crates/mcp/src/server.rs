// HTTP hosting layer for the dispatcher.

use crate::dispatch::Dispatcher;
use crate::protocol::{CallerContext, CLIENT_CONTEXT_HEADER};
use crate::tools::ToolKind;
use anyhow::Result;
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Start the gateway HTTP server.
pub async fn serve(addr: &str, dispatcher: Dispatcher) -> Result<()> {
    let app = create_router(Arc::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the gateway router.
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/tools", get(list_tools))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

/// Dispatch one tool call.
///
/// Always answers 200 with the result envelope; error outcomes ride in
/// the envelope, never in the HTTP status.
async fn invoke(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let context = caller_context(&headers);
    Json(dispatcher.dispatch(&body, context.as_ref()).await)
}

/// The registry's discovery descriptors.
async fn list_tools() -> impl IntoResponse {
    let tools: Vec<_> = ToolKind::ALL.iter().map(|kind| kind.schema()).collect();
    Json(serde_json::json!({ "tools": tools }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "teller",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn caller_context(headers: &HeaderMap) -> Option<CallerContext> {
    headers
        .get(CLIENT_CONTEXT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CallerContext::from_header)
}
