//! Stdio transport command handler.

use color_eyre::Result;
use rmcp::ServiceExt;

use crate::auth::ApiKey;
use crate::config::Config;
use crate::context::Context;
use crate::mcp::McpServer;

use super::App;

impl App {
    /// Run the gateway over stdio.
    ///
    /// The single caller's credential comes from configuration and is
    /// shape-checked before the transport starts; a missing or malformed key
    /// fails startup rather than every later call.
    pub async fn run_mcp(&self) -> Result<()> {
        tracing::info!("Starting Graforest gateway (stdio)");

        let config = Config::load()?;
        let credential = ApiKey::parse(config.gateway.key.as_deref())?;
        let ctx = Context::new(config, credential)?;
        let server = McpServer::new(ctx);

        let service = server.serve(rmcp::transport::stdio()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to start MCP server");
            color_eyre::eyre::eyre!("Failed to start MCP server: {}", e)
        })?;

        tracing::info!("MCP server started, waiting for connections");

        service.waiting().await.map_err(|e| {
            tracing::error!(error = %e, "MCP server error");
            color_eyre::eyre::eyre!("MCP server error: {}", e)
        })?;

        tracing::info!("MCP server shutting down");
        Ok(())
    }
}
