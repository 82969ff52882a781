//! Wire-facing data types shared by the tool layer and the backend facade.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deployment environment a project's Graph API is resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Direction of a graph traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TraverseDirection {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

impl TraverseDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraverseDirection::Outgoing => "outgoing",
            TraverseDirection::Incoming => "incoming",
            TraverseDirection::Both => "both",
        }
    }
}

/// One entity record in a bulk-write batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityRecord {
    /// Unique ID (kebab-case, e.g. 'machine-learning').
    pub entity_id: String,
    /// Schema entity type (e.g. 'Topic', 'Article').
    pub entity_type: String,
    /// Entity properties matching the schema fields for the type.
    pub properties: Map<String, Value>,
}

/// One relationship record in a bulk-write batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipRecord {
    /// Source entity_id.
    pub from_id: String,
    /// Target entity_id.
    pub to_id: String,
    /// Relationship type (e.g. 'AUTHORED', 'COVERS').
    pub rel_type: String,
    /// Optional relationship properties.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// A graph node normalized for the MCP consumer.
///
/// The Graph API speaks `entity_id` / `hierarchical_path`; the gateway
/// reshapes that into the `{id, labels, properties}` form agents expect.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

/// A graph relationship normalized for the MCP consumer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub from_id: String,
    pub to_id: String,
    pub properties: Map<String, Value>,
}

/// Full-text search outcome with the backend count preserved verbatim.
#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub nodes: Vec<GraphNode>,
    pub total: u64,
    pub query: String,
}

/// Traversal outcome: connected nodes plus relationships among them.
#[derive(Debug, Serialize)]
pub struct TraverseOutcome {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
    pub depth: u32,
}

/// One provisioned project as reported by the provisioning API.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub project_code: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

impl ProjectSummary {
    /// Build a summary from a raw provisioning API project object.
    pub fn from_raw(raw: &Value) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            project_id: text("id").or_else(|| text("project_id")),
            name: text("name"),
            project_code: text("project_code"),
            status: text("status"),
            created_at: text("created_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_serde() {
        assert_eq!(
            serde_json::to_value(Environment::Staging).unwrap(),
            json!("staging")
        );
        let env: Environment = serde_json::from_value(json!("production")).unwrap();
        assert_eq!(env, Environment::Production);
        assert_eq!(Environment::default(), Environment::Staging);
    }

    #[test]
    fn test_project_summary_id_fallback() {
        let summary = ProjectSummary::from_raw(&json!({
            "project_id": "p-123",
            "name": "chem101",
            "project_code": "abc12345",
            "status": "deployed",
        }));
        assert_eq!(summary.project_id.as_deref(), Some("p-123"));
        assert_eq!(summary.project_code.as_deref(), Some("abc12345"));
        assert!(summary.created_at.is_none());

        let summary = ProjectSummary::from_raw(&json!({"id": "p-456"}));
        assert_eq!(summary.project_id.as_deref(), Some("p-456"));
    }

    #[test]
    fn test_relationship_record_optional_properties() {
        let rel: RelationshipRecord = serde_json::from_value(json!({
            "from_id": "a",
            "to_id": "b",
            "rel_type": "COVERS",
        }))
        .unwrap();
        assert!(rel.properties.is_none());
    }
}
