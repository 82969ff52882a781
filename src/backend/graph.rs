//! HTTP client for the per-project Graph APIs.
//!
//! Handles data operations: search, traverse, listing, bulk write. The Graph
//! API speaks `entity_id`, `hierarchical_path`, `rel_id`, `rel_type`; this
//! client normalizes those into `{id, labels, properties}` nodes and
//! `{id, type, from_id, to_id, properties}` relationships for the MCP
//! consumer. Counts reported by the backend are preserved verbatim.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::auth::ApiKey;
use crate::config::Config;
use crate::error::GatewayError;
use crate::models::{
    Environment, EntityRecord, GraphNode, GraphRelationship, RelationshipRecord, SearchOutcome,
    TraverseDirection, TraverseOutcome,
};
use crate::validate::MAX_BATCH_SIZE;

use super::request_json;
use super::retry::RetryPolicy;

/// Async HTTP client for deployed Graph APIs.
///
/// The caller's validated API key is forwarded as the bearer token on every
/// request; nothing is cached between calls, so the backend always answers
/// from authoritative state.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    staging: String,
    production: String,
    read_retry: RetryPolicy,
}

impl GraphClient {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.policy.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            staging: config.graph.staging.clone(),
            production: config.graph.production.clone(),
            read_retry: RetryPolicy::reads(&config.policy),
        })
    }

    /// Resolve the Graph API base URL for a project and environment.
    fn base_url(&self, project_code: &str, environment: Environment) -> String {
        let code = project_code.to_lowercase().replace('_', "-");
        let template = match environment {
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        };
        template.replace("{project}", &code)
    }

    // ====================================================================
    // Schema & statistics
    // ====================================================================

    pub async fn get_schema(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}/schema", self.base_url(project_code, environment));
        request_json("get_schema", &self.read_retry, || {
            self.http.get(&url).bearer_auth(token.expose())
        })
        .await
    }

    pub async fn get_statistics(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
    ) -> Result<Value, GatewayError> {
        let url = format!(
            "{}/api/v1/data/stats",
            self.base_url(project_code, environment)
        );
        request_json("get_statistics", &self.read_retry, || {
            self.http.get(&url).bearer_auth(token.expose())
        })
        .await
    }

    // ====================================================================
    // Read operations
    // ====================================================================

    /// Full-text search across all string properties.
    pub async fn search_text(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        query: &str,
    ) -> Result<SearchOutcome, GatewayError> {
        let url = format!(
            "{}/api/v1/data/search/text",
            self.base_url(project_code, environment)
        );
        let body = json!({ "query": query });
        let data = request_json("search_text", &self.read_retry, || {
            self.http.post(&url).bearer_auth(token.expose()).json(&body)
        })
        .await?;

        let nodes: Vec<GraphNode> = data
            .get("nodes")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(normalize_node).collect())
            .unwrap_or_default();

        Ok(SearchOutcome {
            total: data
                .get("count")
                .and_then(Value::as_u64)
                .unwrap_or(nodes.len() as u64),
            query: data
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or(query)
                .to_string(),
            nodes,
        })
    }

    /// Walk the graph from a starting entity.
    ///
    /// Relationships among the returned nodes are fetched best-effort from
    /// the starting node; a failure there degrades to an empty list rather
    /// than failing the traversal.
    pub async fn traverse(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        start_entity_type: &str,
        start_entity_id: &str,
        max_depth: u32,
        direction: TraverseDirection,
    ) -> Result<TraverseOutcome, GatewayError> {
        let base = self.base_url(project_code, environment);
        let url = format!("{base}/api/v1/data/traverse");
        let body = json!({
            "start_entity_type": start_entity_type.to_lowercase(),
            "start_entity_id": start_entity_id,
            "max_depth": max_depth,
            "direction": direction.as_str(),
        });
        let data = request_json("traverse", &self.read_retry, || {
            self.http.post(&url).bearer_auth(token.expose()).json(&body)
        })
        .await?;

        let nodes: Vec<GraphNode> = data
            .get("connected_nodes")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(normalize_node).collect())
            .unwrap_or_default();

        let rels_url = format!(
            "{base}/api/v1/nodes/{}/{start_entity_id}/relationships",
            start_entity_type.to_lowercase()
        );
        let relationships = match request_json("traverse_relationships", &self.read_retry, || {
            self.http
                .get(&rels_url)
                .query(&[("direction", direction.as_str())])
                .query(&[("limit", MAX_BATCH_SIZE)])
                .bearer_auth(token.expose())
        })
        .await
        {
            Ok(raw) => {
                let mut node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
                node_ids.insert(start_entity_id);
                raw.as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(normalize_relationship)
                            .filter(|r| {
                                node_ids.contains(r.from_id.as_str())
                                    && node_ids.contains(r.to_id.as_str())
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Err(err) => {
                tracing::debug!(error = %err, "Could not fetch relationships for traverse");
                Vec::new()
            }
        };

        Ok(TraverseOutcome {
            nodes,
            relationships,
            depth: data
                .get("max_depth")
                .and_then(Value::as_u64)
                .map(|d| d as u32)
                .unwrap_or(max_depth),
        })
    }

    /// List entities of a type. Normalizes: adds `id` = `entity_id`.
    pub async fn list_entities(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        entity_type: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>, GatewayError> {
        let url = format!(
            "{}/api/v1/nodes/{}/",
            self.base_url(project_code, environment),
            entity_type.to_lowercase()
        );
        let data = request_json("list_entities", &self.read_retry, || {
            self.http
                .get(&url)
                .query(&[("limit", limit), ("offset", offset)])
                .bearer_auth(token.expose())
        })
        .await?;

        Ok(data
            .as_array()
            .map(|items| items.iter().map(with_id_field).collect())
            .unwrap_or_default())
    }

    /// Get a single entity by type and ID. Normalizes: adds `id` = `entity_id`.
    pub async fn get_entity(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Value, GatewayError> {
        let url = format!(
            "{}/api/v1/nodes/{}/{entity_id}",
            self.base_url(project_code, environment),
            entity_type.to_lowercase()
        );
        let data = request_json("get_entity", &self.read_retry, || {
            self.http.get(&url).bearer_auth(token.expose())
        })
        .await?;

        Ok(with_id_field(&data))
    }

    // ====================================================================
    // Write operations
    // ====================================================================

    /// Bulk create entities, grouped by type. Returns `{entity_type: count}`.
    ///
    /// Each request is attempted exactly once.
    pub async fn bulk_create_entities(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        entities: &[EntityRecord],
    ) -> Result<BTreeMap<String, u64>, GatewayError> {
        let base = self.base_url(project_code, environment);

        let mut by_type: BTreeMap<&str, Vec<&EntityRecord>> = BTreeMap::new();
        for entity in entities {
            by_type.entry(&entity.entity_type).or_default().push(entity);
        }

        let mut results = BTreeMap::new();
        for (entity_type, records) in by_type {
            let url = format!(
                "{base}/api/v1/data/bulk/nodes/{}",
                entity_type.to_lowercase()
            );
            let mut created = 0u64;

            for chunk in records.chunks(MAX_BATCH_SIZE) {
                let payload = json!({
                    "nodes": chunk
                        .iter()
                        .map(|e| json!({ "entity_id": e.entity_id, "data": e.properties }))
                        .collect::<Vec<_>>(),
                });
                let resp = request_json("bulk_create_entities", &RetryPolicy::single_attempt(), || {
                    self.http
                        .post(&url)
                        .bearer_auth(token.expose())
                        .json(&payload)
                })
                .await?;
                created += resp
                    .get("created")
                    .and_then(Value::as_u64)
                    .unwrap_or(chunk.len() as u64);
            }

            tracing::info!(
                entity_type,
                created,
                total = records.len(),
                "Created entities"
            );
            results.insert(entity_type.to_string(), created);
        }

        Ok(results)
    }

    /// Bulk create relationships, grouped by type. Returns `{rel_type: count}`.
    ///
    /// Each request is attempted exactly once.
    pub async fn bulk_create_relationships(
        &self,
        project_code: &str,
        environment: Environment,
        token: &ApiKey,
        relationships: &[RelationshipRecord],
    ) -> Result<BTreeMap<String, u64>, GatewayError> {
        let base = self.base_url(project_code, environment);

        let mut by_type: BTreeMap<&str, Vec<&RelationshipRecord>> = BTreeMap::new();
        for rel in relationships {
            by_type.entry(&rel.rel_type).or_default().push(rel);
        }

        let mut results = BTreeMap::new();
        for (rel_type, records) in by_type {
            let url = format!(
                "{base}/api/v1/data/bulk/relationships/{}",
                rel_type.to_lowercase()
            );
            let mut created = 0u64;

            for chunk in records.chunks(MAX_BATCH_SIZE) {
                let payload = json!({
                    "relationships": chunk
                        .iter()
                        .map(|r| {
                            let mut item = json!({ "from_id": r.from_id, "to_id": r.to_id });
                            if let Some(props) = &r.properties {
                                if !props.is_empty() {
                                    item["data"] = Value::Object(props.clone());
                                }
                            }
                            item
                        })
                        .collect::<Vec<_>>(),
                });
                let resp = request_json(
                    "bulk_create_relationships",
                    &RetryPolicy::single_attempt(),
                    || {
                        self.http
                            .post(&url)
                            .bearer_auth(token.expose())
                            .json(&payload)
                    },
                )
                .await?;
                created += resp
                    .get("created")
                    .and_then(Value::as_u64)
                    .unwrap_or(chunk.len() as u64);
            }

            tracing::info!(rel_type, created, total = records.len(), "Created relationships");
            results.insert(rel_type.to_string(), created);
        }

        Ok(results)
    }
}

// ====================================================================
// Normalization helpers
// ====================================================================

/// Reshape a raw Graph API node into the normalized MCP form.
fn normalize_node(raw: &Value) -> GraphNode {
    let entity_id = raw
        .get("entity_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let path = raw
        .get("hierarchical_path")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let label = path
        .rsplit(':')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Unknown");

    let mut properties = raw.as_object().cloned().unwrap_or_default();
    properties.insert("id".to_string(), Value::String(entity_id.clone()));

    GraphNode {
        id: entity_id,
        labels: vec![label.to_string()],
        properties,
    }
}

/// Reshape a raw Graph API relationship into the normalized MCP form.
fn normalize_relationship(raw: &Value) -> GraphRelationship {
    let id = raw
        .get("rel_id")
        .or_else(|| raw.get("id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "0".to_string());

    let rel_type = raw
        .get("rel_type")
        .or_else(|| raw.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let field = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    const CONSUMED: [&str; 6] = ["rel_id", "from_id", "to_id", "rel_type", "from_path", "to_path"];
    let properties: Map<String, Value> = raw
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(key, _)| !CONSUMED.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    GraphRelationship {
        id,
        rel_type,
        from_id: field("from_id"),
        to_id: field("to_id"),
        properties,
    }
}

/// Copy of a raw entity object with `id` set from `entity_id`.
fn with_id_field(raw: &Value) -> Value {
    let mut obj = raw.as_object().cloned().unwrap_or_default();
    let id = obj
        .get("entity_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    obj.insert("id".to_string(), Value::String(id));
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> GraphClient {
        GraphClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_base_url_staging() {
        let url = client().base_url("Chem_101", Environment::Staging);
        assert_eq!(url, "https://chem-101-staging.rationalbloks.com");
    }

    #[test]
    fn test_base_url_production() {
        let url = client().base_url("abc12345", Environment::Production);
        assert_eq!(url, "https://abc12345.rationalbloks.com");
    }

    #[test]
    fn test_normalize_node() {
        let node = normalize_node(&json!({
            "entity_id": "machine-learning",
            "hierarchical_path": "Topic:TechnicalTopic",
            "name": "Machine Learning",
        }));
        assert_eq!(node.id, "machine-learning");
        assert_eq!(node.labels, vec!["TechnicalTopic"]);
        assert_eq!(
            node.properties.get("id"),
            Some(&json!("machine-learning"))
        );
        assert_eq!(
            node.properties.get("name"),
            Some(&json!("Machine Learning"))
        );
    }

    #[test]
    fn test_normalize_node_missing_path() {
        let node = normalize_node(&json!({ "entity_id": "iron-fe" }));
        assert_eq!(node.labels, vec!["Unknown"]);
    }

    #[test]
    fn test_normalize_relationship() {
        let rel = normalize_relationship(&json!({
            "rel_id": 42,
            "rel_type": "COVERS",
            "from_id": "article-1",
            "to_id": "machine-learning",
            "from_path": "Article",
            "to_path": "Topic",
            "context": "intro",
        }));
        assert_eq!(rel.id, "42");
        assert_eq!(rel.rel_type, "COVERS");
        assert_eq!(rel.from_id, "article-1");
        assert_eq!(rel.to_id, "machine-learning");
        assert_eq!(rel.properties.get("context"), Some(&json!("intro")));
        assert!(!rel.properties.contains_key("from_path"));
        assert!(!rel.properties.contains_key("rel_id"));
    }

    #[test]
    fn test_with_id_field() {
        let value = with_id_field(&json!({ "entity_id": "rust", "name": "Rust" }));
        assert_eq!(value.get("id"), Some(&json!("rust")));
        assert_eq!(value.get("name"), Some(&json!("Rust")));
    }
}
