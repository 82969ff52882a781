//! MCP server implementation for the Graforest gateway.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, ServerHandler},
    model::{
        GetPromptRequestParam, GetPromptResult, Implementation, ListPromptsResult,
        ListResourcesResult, PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool_handler, ErrorData as McpError, RoleServer,
};

use crate::auth::ApiKey;
use crate::context::Context;
use crate::di::FromRef;
use crate::mcp::resources;

/// Graforest MCP server exposing the knowledge graph tool catalogue.
///
/// The catalogue is fixed at compile time: five family routers (provisioning,
/// bulk write, read, ingestion, utility) are combined into one immutable
/// router, so adding or removing a tool is a compile-checked change and
/// lookups need no locking. The server holds no per-call state; every
/// invocation resolves its backend client fresh from the context.
#[derive(Clone)]
pub struct McpServer {
    pub(crate) ctx: Arc<Context>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    /// Create a new Graforest MCP server with the given context.
    pub fn new(ctx: Context) -> Self {
        tracing::info!("Initializing Graforest MCP server");

        Self {
            ctx: Arc::new(ctx),
            tool_router: Self::tool_router(),
        }
    }

    /// Build the combined tool router from all tool family modules.
    fn tool_router() -> ToolRouter<Self> {
        Self::project_tools()
            + Self::write_tools()
            + Self::read_tools()
            + Self::ingest_tools()
            + Self::fetch_tools()
    }

    /// Resolve a dependency from the context.
    pub fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(&self.ctx)
    }

    /// The validated gateway credential, forwarded to Graph API calls.
    pub(crate) fn credential(&self) -> &ApiKey {
        &self.ctx.credential
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"Graforest — Knowledge Graph Data Operations

Store, search, and explore knowledge graphs. NO AI inside — YOU are the intelligence.

FAST INGESTION (recommended — 3 tool calls):
1. ingest_text_content(project_code, text) → returns schema + extraction instructions
2. Extract ALL entities and relationships from the text in one pass
3. add_knowledge_nodes(project_code, entities) → bulk create all nodes
4. add_knowledge_relationships(project_code, relationships) → bulk create all edges

EXPLORATION:
- search_knowledge_graph → full-text search across all properties
- traverse_knowledge_graph → walk connections from a node
- list_knowledge_entities / get_knowledge_entity → read data

MANAGEMENT:
- list_knowledge_projects → find your graph
- create_knowledge_project → provision a new graph
- get_knowledge_schema → see entity types and fields

13 tools: 3 provisioning + 2 data write + 6 read + 1 ingestion + 1 utility"#
                    .to_string(),
            ),
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult {
            next_cursor: None,
            resources: resources::static_resources(),
        }))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        let result = match resources::read_static_resource(&request.uri) {
            Some(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, request.uri.clone())],
            }),
            None => Err(McpError::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            )),
        };
        std::future::ready(result)
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListPromptsResult {
            next_cursor: None,
            prompts: resources::prompt_catalogue(),
        }))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        let args = request.arguments.unwrap_or_default();
        let text_arg = |key: &str| {
            args.get(key)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let result = match request.name.as_str() {
            "ingest-content" => Ok(resources::ingest_prompt(
                &text_arg("project_code"),
                &text_arg("text"),
            )),
            "explore-graph" => {
                let topic = text_arg("topic");
                Ok(resources::explore_prompt(
                    &text_arg("project_code"),
                    (!topic.is_empty()).then_some(topic.as_str()),
                ))
            }
            name => Err(McpError::invalid_params(
                format!("Unknown prompt: {name}"),
                None,
            )),
        };
        std::future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOL_NAMES: [&str; 13] = [
        "create_knowledge_project",
        "list_knowledge_projects",
        "delete_knowledge_project",
        "add_knowledge_nodes",
        "add_knowledge_relationships",
        "search_knowledge_graph",
        "get_knowledge_schema",
        "get_knowledge_statistics",
        "traverse_knowledge_graph",
        "list_knowledge_entities",
        "get_knowledge_entity",
        "ingest_text_content",
        "fetch_url_content",
    ];

    #[test]
    fn test_catalogue_is_exactly_thirteen_tools() {
        let router = McpServer::tool_router();
        let tools = router.list_all();
        assert_eq!(tools.len(), TOOL_NAMES.len());

        for name in TOOL_NAMES {
            assert!(
                tools.iter().any(|tool| tool.name == name),
                "missing tool {name}"
            );
        }
    }

    #[test]
    fn test_unknown_tool_not_in_catalogue() {
        let router = McpServer::tool_router();
        assert!(!router
            .list_all()
            .iter()
            .any(|tool| tool.name == "drop_all_graphs"));
    }
}
