//! Provisioning tools - create, list, and delete graph projects.
//!
//! These run against the provisioning API under the Graforest service
//! account; none of them touches a project's Graph API.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::provision::ProvisionClient;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::models::ProjectSummary;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for create_knowledge_project tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    /// Project name (e.g. 'AI Research Papers').
    pub name: String,
    /// Optional project description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters for delete_knowledge_project tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteProjectParams {
    /// Project ID to delete (UUID).
    pub project_id: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// Result of project creation.
#[derive(Debug, Serialize)]
pub struct CreateProjectResult {
    pub project_id: Option<String>,
    pub project_code: Option<String>,
    pub name: Option<String>,
    pub status: String,
    pub message: String,
    pub graph_api_url: Option<String>,
}

/// Result of listing projects.
#[derive(Debug, Serialize)]
pub struct ListProjectsResult {
    pub projects: Vec<ProjectSummary>,
    pub count: usize,
}

/// Result of project deletion.
#[derive(Debug, Serialize)]
pub struct DeleteProjectResult {
    pub project_id: String,
    pub status: String,
    pub message: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = project_tools, vis = "pub(crate)")]
impl McpServer {
    /// Provision a new knowledge graph project.
    ///
    /// Creates the project with the knowledge-optimized default schema,
    /// deploys it to staging, and polls the deployment job to completion.
    #[tool(
        description = "Provision a new knowledge graph project. Creates a Neo4j graph database with a knowledge-optimized schema (Topics, Articles, Authors, Concepts) and deploys it to staging. May take 30-60 seconds."
    )]
    pub async fn create_knowledge_project(
        &self,
        Parameters(params): Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(name = %params.name, "Running create_knowledge_project tool");

        let provision = self.resolve::<ProvisionClient>();
        let info = provision
            .provision_graph_project(&params.name, params.description.as_deref())
            .await?;

        let text = |key: &str| info.get(key).and_then(Value::as_str).map(str::to_string);
        let response = CreateProjectResult {
            project_id: text("id").or_else(|| text("project_id")),
            project_code: text("project_code"),
            name: text("name"),
            status: "deployed".to_string(),
            message: "Knowledge graph created and deployed to staging".to_string(),
            graph_api_url: text("staging_url").or_else(|| text("graph_api_url")),
        };

        tracing::info!(
            project_code = response.project_code.as_deref().unwrap_or(""),
            "Knowledge graph project created"
        );

        Response(response).into()
    }

    /// List all provisioned graph projects.
    #[tool(
        description = "List all graph projects. Shows project IDs, names, codes, and status."
    )]
    pub async fn list_knowledge_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::info!("Running list_knowledge_projects tool");

        let provision = self.resolve::<ProvisionClient>();
        let projects = provision.list_projects().await?;

        // The service account may also own relational projects; only graph
        // projects belong in this catalogue.
        let projects: Vec<ProjectSummary> = projects
            .iter()
            .filter(|project| {
                project
                    .get("project_type")
                    .and_then(Value::as_str)
                    .unwrap_or("graph")
                    != "relational"
            })
            .map(ProjectSummary::from_raw)
            .collect();

        let response = ListProjectsResult {
            count: projects.len(),
            projects,
        };

        tracing::info!(count = response.count, "Listed knowledge graph projects");

        Response(response).into()
    }

    /// Delete a graph project and all its data.
    #[tool(
        description = "Delete a graph project and ALL its data. DESTRUCTIVE - cannot be undone."
    )]
    pub async fn delete_knowledge_project(
        &self,
        Parameters(params): Parameters<DeleteProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(project_id = %params.project_id, "Running delete_knowledge_project tool");

        let provision = self.resolve::<ProvisionClient>();
        provision.delete_graph_project(&params.project_id).await?;

        let response = DeleteProjectResult {
            project_id: params.project_id.clone(),
            status: "deleted".to_string(),
            message: "Graph project and all data permanently deleted".to_string(),
        };

        tracing::info!(project_id = %params.project_id, "Deleted knowledge graph project");

        Response(response).into()
    }
}
