//! Utility tool - fetch URL content for ingestion.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::Deserialize;

use crate::backend::fetch::FetchClient;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;

/// Parameters for fetch_url_content tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchUrlParams {
    /// URL to scrape (http or https).
    pub url: String,
}

#[tool_router(router = fetch_tools, vis = "pub(crate)")]
impl McpServer {
    /// Fetch a URL and extract clean text content.
    #[tool(
        description = "Scrape a URL and extract clean text content. Returns the text for the LLM to read, extract entities from, and then call add_knowledge_nodes/relationships. Also returns transport metadata (content type, status code)."
    )]
    pub async fn fetch_url_content(
        &self,
        Parameters(params): Parameters<FetchUrlParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(url = %params.url, "Running fetch_url_content tool");

        let fetch = self.resolve::<FetchClient>();
        let outcome = fetch.fetch(&params.url).await?;

        tracing::info!(chars = outcome.char_count, "Fetched URL content");

        Response(outcome).into()
    }
}
