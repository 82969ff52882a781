//! HTTP transport command handler.
//!
//! Serves the same tool pipeline as the stdio transport over rmcp's
//! streamable HTTP service, behind a bearer-key middleware. Each client
//! session gets its own `McpServer` instance; the MCP session layer keeps
//! per-connection calls and results in order, and backend I/O holds no
//! process-wide lock, so sessions never block each other.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use color_eyre::Result;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde_json::json;
use tower::ServiceBuilder;

use crate::auth::ApiKey;
use crate::config::Config;
use crate::context::Context;
use crate::mcp::McpServer;

use super::App;

/// Authentication middleware state.
#[derive(Clone)]
pub struct AuthState {
    expected: ApiKey,
}

impl AuthState {
    pub fn new(expected: ApiKey) -> Self {
        Self { expected }
    }
}

/// Liveness probe for external orchestration.
///
/// Must answer quickly regardless of backend health, so it touches nothing
/// but the process itself.
async fn health() -> Response {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

/// Static server descriptor for clients discovering the gateway.
async fn server_card() -> Response {
    Json(json!({
        "name": "graforest",
        "displayName": "Graforest",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Knowledge graph gateway - MCP server for Graforest graph operations",
        "vendor": "Graforest",
        "homepage": "https://graforest.ai",
        "documentation": "https://graforest.ai/docs",
        "capabilities": {
            "tools": true,
            "resources": true,
            "prompts": true,
        },
        "authentication": {
            "type": "bearer",
            "scheme": "Bearer",
            "description": "Graforest API key (format: gf_sk_...)",
            "header": "Authorization: Bearer gf_sk_...",
        },
    }))
    .into_response()
}

/// Authentication middleware: shape-check the bearer key and require a match
/// with the configured gateway key.
///
/// The liveness and discovery endpoints stay open; everything else is gated
/// before any tool handler can run.
async fn auth_middleware(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path == "/health" || path.starts_with("/.well-known/") {
        return next.run(req).await;
    }

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match ApiKey::from_bearer(header) {
        Ok(key) if key == state.expected => next.run(req).await,
        Ok(_) => unauthorized("API key not recognized"),
        Err(err) => unauthorized(&err.to_string()),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "kind": "auth", "message": message } })),
    )
        .into_response()
}

/// Assemble the HTTP router: MCP service, liveness, discovery, auth gate.
pub fn build_router(ctx: Context, auth_state: AuthState) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(McpServer::new(ctx.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/health", get(health))
        .route("/.well-known/mcp/server-card.json", get(server_card))
        .fallback_service(ServiceBuilder::new().service(service))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
}

impl App {
    /// Run the gateway over streamable HTTP.
    pub async fn run_serve(&self, host: &str, port: u16) -> Result<()> {
        tracing::info!("Starting Graforest gateway (HTTP)");

        let config = Config::load()?;

        // The configured key both authenticates callers and is forwarded to
        // the Graph API, so HTTP mode cannot start without it.
        let credential = ApiKey::parse(config.gateway.key.as_deref())?;
        let auth_state = AuthState::new(credential.clone());

        let ctx = Context::new(config, credential)?;
        let app = build_router(ctx, auth_state);

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("Graforest HTTP server listening on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            color_eyre::eyre::eyre!("HTTP server error: {}", e)
        })?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}
