//! Read tools - search, schema, statistics, traversal, listing.
//!
//! All of these are idempotent against the Graph API, so the facade retries
//! them transparently on transient failure.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::backend::graph::GraphClient;
use crate::config::Config;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::models::{Environment, TraverseDirection};
use crate::validate::{check_depth, check_page};

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for search_knowledge_graph tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Search text (e.g. 'machine learning', 'Python').
    pub query: String,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for get_knowledge_schema tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SchemaParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for get_knowledge_statistics tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatisticsParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for traverse_knowledge_graph tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TraverseParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Entity type of the starting node (e.g. 'Topic').
    pub start_entity_type: String,
    /// Entity ID of the starting node.
    pub start_entity_id: String,
    /// Maximum traversal depth (1-5, default 3).
    #[serde(default)]
    pub max_depth: Option<u32>,
    /// Traversal direction (default 'both').
    #[serde(default)]
    pub direction: Option<TraverseDirection>,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for list_knowledge_entities tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEntitiesParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Entity type to list (e.g. 'Topic', 'Article').
    pub entity_type: String,
    /// Max results (1-500, default 50).
    #[serde(default)]
    pub limit: Option<u32>,
    /// Offset for pagination.
    #[serde(default)]
    pub offset: Option<u32>,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for get_knowledge_entity tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetEntityParams {
    /// Project code — from list_knowledge_projects.
    pub project_code: String,
    /// Entity type (e.g. 'Topic', 'Article').
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: String,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

// ============================================================================
// Response Types
// ============================================================================

/// Result of list_knowledge_entities. The count is the backend's, verbatim.
#[derive(Debug, Serialize)]
pub struct ListEntitiesResult {
    pub entities: Vec<Value>,
    pub count: usize,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = read_tools, vis = "pub(crate)")]
impl McpServer {
    /// Full-text search across all string properties in the knowledge graph.
    #[tool(
        description = "Full-text search across all string properties in the knowledge graph. Returns matching nodes with their types, properties, and relevance scores."
    )]
    pub async fn search_knowledge_graph(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            query = %params.query,
            "Running search_knowledge_graph tool"
        );

        let graph = self.resolve::<GraphClient>();
        let outcome = graph
            .search_text(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.query,
            )
            .await?;

        tracing::info!(total = outcome.total, "Search complete");

        Response(outcome).into()
    }

    /// Get the full graph schema.
    #[tool(
        description = "Get the full schema - entity types with fields, relationship types with from/to mappings. CALL THIS FIRST before adding nodes or relationships to understand what types and fields are available."
    )]
    pub async fn get_knowledge_schema(
        &self,
        Parameters(params): Parameters<SchemaParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(project = %params.project_code, "Running get_knowledge_schema tool");

        let graph = self.resolve::<GraphClient>();
        let schema = graph
            .get_schema(&params.project_code, params.environment, self.credential())
            .await?;

        Response(schema).into()
    }

    /// Get node/relationship counts broken down by type.
    #[tool(
        description = "Get node/relationship counts broken down by type. Useful for understanding the graph's size and composition."
    )]
    pub async fn get_knowledge_statistics(
        &self,
        Parameters(params): Parameters<StatisticsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(project = %params.project_code, "Running get_knowledge_statistics tool");

        let graph = self.resolve::<GraphClient>();
        let statistics = graph
            .get_statistics(&params.project_code, params.environment, self.credential())
            .await?;

        Response(statistics).into()
    }

    /// Walk the graph from a starting entity up to a bounded depth.
    #[tool(
        description = "Walk the graph from a starting entity, following relationships up to a specified depth (1-5). Returns connected nodes and relationships."
    )]
    pub async fn traverse_knowledge_graph(
        &self,
        Parameters(params): Parameters<TraverseParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            start = %params.start_entity_id,
            "Running traverse_knowledge_graph tool"
        );

        let config = self.resolve::<Arc<Config>>();
        let depth = check_depth(&config.policy, params.max_depth)?;

        let graph = self.resolve::<GraphClient>();
        let outcome = graph
            .traverse(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.start_entity_type,
                &params.start_entity_id,
                depth,
                params.direction.unwrap_or_default(),
            )
            .await?;

        tracing::info!(
            nodes = outcome.nodes.len(),
            relationships = outcome.relationships.len(),
            "Traversal complete"
        );

        Response(outcome).into()
    }

    /// List entities of a specific type with pagination.
    #[tool(
        description = "List entities of a specific type. Use get_knowledge_schema first to see available entity types."
    )]
    pub async fn list_knowledge_entities(
        &self,
        Parameters(params): Parameters<ListEntitiesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            entity_type = %params.entity_type,
            "Running list_knowledge_entities tool"
        );

        let config = self.resolve::<Arc<Config>>();
        let (limit, offset) = check_page(&config.policy, params.limit, params.offset)?;

        let graph = self.resolve::<GraphClient>();
        let entities = graph
            .list_entities(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.entity_type,
                limit,
                offset,
            )
            .await?;

        let response = ListEntitiesResult {
            count: entities.len(),
            entities,
        };

        Response(response).into()
    }

    /// Get a single entity by type and ID, with all properties.
    #[tool(description = "Get a single entity by type and ID, with all properties.")]
    pub async fn get_knowledge_entity(
        &self,
        Parameters(params): Parameters<GetEntityParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            entity_id = %params.entity_id,
            "Running get_knowledge_entity tool"
        );

        let graph = self.resolve::<GraphClient>();
        let entity = graph
            .get_entity(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.entity_type,
                &params.entity_id,
            )
            .await?;

        Response(entity).into()
    }
}
