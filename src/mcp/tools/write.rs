//! Bulk write tools - nodes and relationships.
//!
//! Batches are size-checked before any backend request goes out: an
//! oversized batch is rejected whole, never partially dispatched. The facade
//! attempts each write exactly once.

use std::collections::BTreeMap;

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::backend::graph::GraphClient;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::models::{EntityRecord, Environment, RelationshipRecord};
use crate::validate::check_batch;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for add_knowledge_nodes tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddNodesParams {
    /// Project code (e.g. 'abc12345') — from list_knowledge_projects.
    pub project_code: String,
    /// Entities to create. At most 500 per call.
    pub entities: Vec<EntityRecord>,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

/// Parameters for add_knowledge_relationships tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddRelationshipsParams {
    /// Project code (e.g. 'abc12345') — from list_knowledge_projects.
    pub project_code: String,
    /// Relationships to create. At most 500 per call.
    pub relationships: Vec<RelationshipRecord>,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

// ============================================================================
// Response Types
// ============================================================================

/// Result of a bulk write, with created counts broken down by type.
#[derive(Debug, Serialize)]
pub struct BulkWriteResult {
    pub created: BTreeMap<String, u64>,
    pub total_created: u64,
    pub message: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = write_tools, vis = "pub(crate)")]
impl McpServer {
    /// Bulk create entities in the knowledge graph.
    #[tool(
        description = "Bulk create entities in the knowledge graph. Each entity needs an entity_id (kebab-case), entity_type (matching schema - e.g. 'Topic', 'Article', 'Author', 'Concept'), and properties matching that type's schema fields. At most 500 entities per call. Use get_knowledge_schema first to see available entity types and their fields."
    )]
    pub async fn add_knowledge_nodes(
        &self,
        Parameters(params): Parameters<AddNodesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            count = params.entities.len(),
            "Running add_knowledge_nodes tool"
        );

        check_batch("entities", params.entities.len())?;

        let graph = self.resolve::<GraphClient>();
        let created = graph
            .bulk_create_entities(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.entities,
            )
            .await?;

        let total_created: u64 = created.values().sum();
        let response = BulkWriteResult {
            message: format!("Created {total_created} nodes across {} types", created.len()),
            total_created,
            created,
        };

        tracing::info!(total = response.total_created, "Added knowledge nodes");

        Response(response).into()
    }

    /// Bulk create relationships between entities in the knowledge graph.
    #[tool(
        description = "Bulk create relationships between entities in the knowledge graph. Each relationship needs from_id, to_id (matching existing entity_ids), rel_type (matching schema - e.g. 'AUTHORED', 'COVERS', 'REFERENCES'), and optional properties. At most 500 relationships per call. Use get_knowledge_schema first to see available relationship types."
    )]
    pub async fn add_knowledge_relationships(
        &self,
        Parameters(params): Parameters<AddRelationshipsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            count = params.relationships.len(),
            "Running add_knowledge_relationships tool"
        );

        check_batch("relationships", params.relationships.len())?;

        let graph = self.resolve::<GraphClient>();
        let created = graph
            .bulk_create_relationships(
                &params.project_code,
                params.environment,
                self.credential(),
                &params.relationships,
            )
            .await?;

        let total_created: u64 = created.values().sum();
        let response = BulkWriteResult {
            message: format!(
                "Created {total_created} relationships across {} types",
                created.len()
            ),
            total_created,
            created,
        };

        tracing::info!(total = response.total_created, "Added knowledge relationships");

        Response(response).into()
    }
}
