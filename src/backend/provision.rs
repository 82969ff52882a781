//! HTTP client for the infrastructure-provisioning gateway.
//!
//! Graforest provisions graph projects through the public RationalBloks MCP
//! gateway, authenticated with the Graforest service account key
//! (`rb_sk_...`); individual gateway users never see that key. Every
//! operation goes through a single endpoint: `POST /api/mcp/execute` with a
//! `{tool, arguments}` envelope.

use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::GatewayError;

use super::request_json;
use super::retry::RetryPolicy;

/// Default schema used when provisioning a new knowledge graph.
///
/// A flexible general-purpose vocabulary that suits most knowledge graph use
/// cases: Topics (with nested technical specializations), Articles, Authors,
/// and Concepts.
pub static KNOWLEDGE_GRAPH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "nodes": {
            "Topic": {
                "description": "A broad knowledge area",
                "flat_labels": ["Category"],
                "schema": {
                    "name": { "type": "string", "required": true },
                    "description": { "type": "string" },
                },
                "TechnicalTopic": {
                    "description": "A technical/scientific topic",
                    "flat_labels": ["Technical"],
                    "schema": {
                        "domain": { "type": "string", "required": true },
                        "difficulty_level": { "type": "string" },
                    },
                    "ProgrammingLanguage": {
                        "description": "A programming language",
                        "flat_labels": ["Language"],
                        "schema": {
                            "paradigm": { "type": "string", "required": true },
                            "first_appeared": { "type": "integer" },
                            "typing": { "type": "string" },
                        },
                    },
                },
            },
            "Article": {
                "description": "A written piece of content",
                "flat_labels": ["Document"],
                "schema": {
                    "title": { "type": "string", "required": true },
                    "abstract": { "type": "string", "required": true },
                    "published_date": { "type": "date" },
                    "doi": { "type": "string" },
                    "url": { "type": "string" },
                },
            },
            "Author": {
                "description": "A content creator or researcher",
                "flat_labels": ["Person"],
                "schema": {
                    "name": { "type": "string", "required": true },
                    "affiliation": { "type": "string" },
                    "orcid": { "type": "string" },
                    "email": { "type": "string" },
                },
            },
            "Concept": {
                "description": "An abstract concept or idea",
                "flat_labels": ["Idea"],
                "schema": {
                    "name": { "type": "string", "required": true },
                    "definition": { "type": "string", "required": true },
                    "aliases": { "type": "json" },
                },
            },
        },
        "relationships": {
            "AUTHORED": {
                "from": "Author",
                "to": "Article",
                "cardinality": "ONE_TO_MANY",
                "data_schema": { "contribution": { "type": "string" } },
            },
            "COVERS": {
                "from": "Article",
                "to": "Topic",
                "cardinality": "MANY_TO_MANY",
            },
            "REFERENCES": {
                "from": "Article",
                "to": "Article",
                "cardinality": "MANY_TO_MANY",
                "data_schema": { "context": { "type": "string" } },
            },
            "PREREQUISITE_OF": {
                "from": "Concept",
                "to": "Concept",
                "cardinality": "MANY_TO_MANY",
                "data_schema": { "strength": { "type": "string" } },
            },
            "DEFINES": {
                "from": "Article",
                "to": "Concept",
                "cardinality": "MANY_TO_MANY",
            },
        },
    })
});

/// Async HTTP client for the provisioning gateway.
#[derive(Clone)]
pub struct ProvisionClient {
    http: reqwest::Client,
    base_url: String,
    key: Option<String>,
    read_retry: RetryPolicy,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ProvisionClient {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.policy.provision_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.provision.url.trim_end_matches('/').to_string(),
            key: config.provision.key.clone(),
            read_retry: RetryPolicy::reads(&config.policy),
            poll_interval: Duration::from_secs(config.policy.provision_poll_secs),
            max_wait: Duration::from_secs(config.policy.provision_wait_secs),
        })
    }

    fn service_key(&self) -> Result<&str, GatewayError> {
        self.key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(GatewayError::MissingServiceKey)
    }

    /// Execute a provisioning tool via the gateway envelope.
    ///
    /// The `{success, result, error}` envelope is the gateway's own wire
    /// contract, so its error string is safe to surface.
    async fn execute(
        &self,
        tool: &'static str,
        arguments: Value,
        policy: &RetryPolicy,
    ) -> Result<Value, GatewayError> {
        let key = self.service_key()?.to_string();
        let url = format!("{}/api/mcp/execute", self.base_url);
        let payload = json!({ "tool": tool, "arguments": arguments });

        let envelope = request_json(tool, policy, || {
            self.http.post(&url).bearer_auth(&key).json(&payload)
        })
        .await?;

        if !envelope
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let message = envelope
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown provisioning error")
                .to_string();
            return Err(GatewayError::Provisioning { message });
        }

        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    // ====================================================================
    // Graph project operations
    // ====================================================================

    /// Create a new graph project with the knowledge-graph schema.
    pub async fn create_graph_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let mut args = json!({
            "name": name,
            "schema": KNOWLEDGE_GRAPH_SCHEMA.clone(),
        });
        if let Some(description) = description {
            args["description"] = Value::String(description.to_string());
        }
        self.execute("create_graph_project", args, &RetryPolicy::single_attempt())
            .await
    }

    /// Deploy a graph project to staging.
    pub async fn deploy_graph_staging(&self, project_id: &str) -> Result<Value, GatewayError> {
        self.execute(
            "deploy_graph_staging",
            json!({ "project_id": project_id }),
            &RetryPolicy::single_attempt(),
        )
        .await
    }

    /// Get status of a deployment job.
    pub async fn get_job_status(&self, job_id: &str) -> Result<Value, GatewayError> {
        self.execute(
            "get_job_status",
            json!({ "job_id": job_id }),
            &self.read_retry,
        )
        .await
    }

    /// Get detailed info about a graph project.
    pub async fn get_graph_project_info(&self, project_id: &str) -> Result<Value, GatewayError> {
        self.execute(
            "get_graph_project_info",
            json!({ "project_id": project_id }),
            &self.read_retry,
        )
        .await
    }

    /// Get the full graph schema (nodes, relationships, field types).
    pub async fn get_graph_schema(&self, project_id: &str) -> Result<Value, GatewayError> {
        self.execute(
            "get_graph_schema",
            json!({ "project_id": project_id }),
            &self.read_retry,
        )
        .await
    }

    /// List all projects under the service account.
    pub async fn list_projects(&self) -> Result<Vec<Value>, GatewayError> {
        let raw = self
            .execute("list_projects", json!({}), &self.read_retry)
            .await?;
        Ok(match raw {
            Value::Object(mut obj) => match obj.remove("projects") {
                Some(Value::Array(projects)) => projects,
                _ => Vec::new(),
            },
            Value::Array(projects) => projects,
            _ => Vec::new(),
        })
    }

    /// Delete a graph project and all associated resources.
    pub async fn delete_graph_project(&self, project_id: &str) -> Result<Value, GatewayError> {
        self.execute(
            "delete_graph_project",
            json!({ "project_id": project_id }),
            &RetryPolicy::single_attempt(),
        )
        .await
    }

    // ====================================================================
    // Provisioning workflow
    // ====================================================================

    /// Full provisioning: create → deploy → poll → return project info.
    pub async fn provision_graph_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Value, GatewayError> {
        tracing::info!(name, "Provisioning graph project");

        let fallback_description = format!("Graforest knowledge graph: {name}");
        let project = self
            .create_graph_project(name, Some(description.unwrap_or(&fallback_description)))
            .await?;
        let project_id = project
            .get("id")
            .or_else(|| project.get("project_id"))
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Provisioning {
                message: "create_graph_project returned no project ID".to_string(),
            })?
            .to_string();
        tracing::info!(project_id = %project_id, name, "Created graph project");

        let deploy = self.deploy_graph_staging(&project_id).await?;
        let job_id = deploy
            .get("job_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Provisioning {
                message: "deploy_graph_staging returned no job_id".to_string(),
            })?
            .to_string();
        tracing::info!(job_id = %job_id, "Deployment started");

        let mut elapsed = Duration::ZERO;
        loop {
            if elapsed >= self.max_wait {
                return Err(GatewayError::BackendTimeout {
                    operation: format!("provision_graph_project({project_id})"),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
            elapsed += self.poll_interval;

            let status = self.get_job_status(&job_id).await?;
            match status.get("status").and_then(Value::as_str).unwrap_or("unknown") {
                "completed" => {
                    tracing::info!(project_id = %project_id, elapsed_secs = elapsed.as_secs(), "Deployment completed");
                    break;
                }
                "failed" | "error" => {
                    let message = status
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown deployment error")
                        .to_string();
                    return Err(GatewayError::Provisioning { message });
                }
                state => {
                    tracing::debug!(job_id = %job_id, state, elapsed_secs = elapsed.as_secs(), "Deployment in progress");
                }
            }
        }

        let info = self.get_graph_project_info(&project_id).await?;
        tracing::info!(
            project_code = info.get("project_code").and_then(|v| v.as_str()).unwrap_or(&project_id),
            "Graph project ready"
        );
        Ok(info)
    }
}
