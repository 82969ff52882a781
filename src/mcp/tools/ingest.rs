//! Ingestion preparation tool.
//!
//! The gateway performs no extraction itself: this tool fetches the
//! project's schema and returns it with structured extraction instructions,
//! so the calling agent can extract everything in one pass and write it back
//! with the two bulk tools.

use std::sync::Arc;

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::backend::graph::GraphClient;
use crate::backend::provision::ProvisionClient;
use crate::config::Config;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::models::Environment;
use crate::validate::check_text_content;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for ingest_text_content tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IngestParams {
    /// Project code (e.g. 'abc12345') — from list_knowledge_projects.
    pub project_code: String,
    /// The full text to extract knowledge from (50 to 500k chars). Can be a
    /// book chapter, article, lecture notes, etc.
    pub text_content: String,
    /// Optional title/name of the source material.
    #[serde(default)]
    pub source_title: Option<String>,
    /// Optional URL of the source material.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Target environment.
    #[serde(default)]
    pub environment: Environment,
}

// ============================================================================
// Response Types
// ============================================================================

/// Source metadata echoed back with the extraction instructions.
#[derive(Debug, Serialize)]
pub struct IngestSource {
    pub title: String,
    pub url: String,
    pub char_count: usize,
    pub word_count: usize,
    pub estimated_tokens: usize,
}

/// Schema vocabulary for the extraction pass.
#[derive(Debug, Serialize)]
pub struct IngestSchema {
    pub entity_types: Map<String, Value>,
    pub relationship_types: Map<String, Value>,
    pub field_details: Value,
}

/// Result of ingest_text_content.
#[derive(Debug, Serialize)]
pub struct IngestResult {
    pub status: &'static str,
    pub project_code: String,
    pub source: IngestSource,
    pub schema: IngestSchema,
    pub extraction_instructions: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = ingest_tools, vis = "pub(crate)")]
impl McpServer {
    /// Prepare a block of text for the bulk extraction workflow.
    #[tool(
        description = "BATCH INGESTION - the fast way to populate a knowledge graph. Provide a large block of text (up to 500k chars) and the project code. This tool fetches the graph schema and returns structured extraction instructions. Then call add_knowledge_nodes and add_knowledge_relationships with the extracted data. 3-CALL WORKFLOW: 1. ingest_text_content(project_code, text) -> schema + instructions. 2. add_knowledge_nodes(project_code, entities) -> bulk create nodes. 3. add_knowledge_relationships(project_code, relationships) -> bulk create edges. Extract EVERYTHING from the text in one pass, then write it all in two bulk calls."
    )]
    pub async fn ingest_text_content(
        &self,
        Parameters(params): Parameters<IngestParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            project = %params.project_code,
            chars = params.text_content.len(),
            "Running ingest_text_content tool"
        );

        let config = self.resolve::<Arc<Config>>();
        check_text_content(&config.policy, &params.text_content)?;

        // The project's live schema drives the extraction vocabulary.
        let graph = self.resolve::<GraphClient>();
        let schema = graph
            .get_schema(&params.project_code, params.environment, self.credential())
            .await?;
        let (entity_types, relationship_types) = build_extraction_guide(&schema);

        // Field-level details come from the provisioning API; failures here
        // degrade to a hint rather than failing the ingestion.
        let provision = self.resolve::<ProvisionClient>();
        let field_details = match fetch_field_details(&provision, &params.project_code).await {
            Some(guide) => Value::Object(guide),
            None => {
                tracing::debug!("Could not fetch full schema for extraction guide");
                Value::String("Use get_knowledge_schema for field details".to_string())
            }
        };

        let char_count = params.text_content.chars().count();
        let word_count = params.text_content.split_whitespace().count();

        let response = IngestResult {
            status: "ready_for_extraction",
            project_code: params.project_code.clone(),
            source: IngestSource {
                title: params.source_title.unwrap_or_default(),
                url: params.source_url.unwrap_or_default(),
                char_count,
                word_count,
                estimated_tokens: char_count / 4,
            },
            extraction_instructions: extraction_instructions(&entity_types, &relationship_types),
            schema: IngestSchema {
                entity_types,
                relationship_types,
                field_details,
            },
        };

        tracing::info!(
            project = %params.project_code,
            words = word_count,
            "Text ready for extraction"
        );

        Response(response).into()
    }
}

// ============================================================================
// Extraction guide helpers
// ============================================================================

/// Reduce a Graph API schema to the entity/relationship vocabulary the
/// extraction pass needs.
fn build_extraction_guide(schema: &Value) -> (Map<String, Value>, Map<String, Value>) {
    let mut entity_types = Map::new();
    if let Some(entities) = schema.get("entities").and_then(Value::as_object) {
        for (key, info) in entities {
            let path = info
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string();
            entity_types.insert(key.clone(), json!({ "path": path }));
        }
    }

    let mut relationship_types = Map::new();
    if let Some(relationships) = schema.get("relationships").and_then(Value::as_object) {
        for (key, info) in relationships {
            let type_name = info
                .get("type_name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| key.to_uppercase());
            relationship_types.insert(
                key.clone(),
                json!({
                    "type_name": type_name,
                    "from": info.get("from_path").and_then(Value::as_str).unwrap_or(""),
                    "to": info.get("to_path").and_then(Value::as_str).unwrap_or(""),
                }),
            );
        }
    }

    (entity_types, relationship_types)
}

/// Render the instruction text for the extraction pass.
fn extraction_instructions(
    entity_types: &Map<String, Value>,
    relationship_types: &Map<String, Value>,
) -> String {
    let entity_names: Vec<&str> = entity_types.keys().map(String::as_str).collect();
    let relationship_names: Vec<&str> = relationship_types.keys().map(String::as_str).collect();

    format!(
        "Extract ALL entities and relationships from the provided text.\n\n\
         ENTITY TYPES available: {}\n\
         RELATIONSHIP TYPES available: {}\n\n\
         RULES:\n\
         1. Use kebab-case entity_ids (e.g., 'machine-learning', 'iron-fe')\n\
         2. Entity types must match the schema keys exactly (lowercase)\n\
         3. Include ALL required fields for each entity type\n\
         4. Extract as many entities as the text supports - be thorough\n\
         5. Create relationships between related entities\n\
         6. Relationship from_id and to_id must match entity_ids you created\n\n\
         NEXT STEPS:\n\
         1. Process the text and extract entities + relationships\n\
         2. Call add_knowledge_nodes with ALL extracted entities\n\
         3. Call add_knowledge_relationships with ALL extracted relationships",
        entity_names.join(", "),
        relationship_names.join(", "),
    )
}

/// Best-effort fetch of field-level schema details via the provisioning API.
async fn fetch_field_details(
    provision: &ProvisionClient,
    project_code: &str,
) -> Option<Map<String, Value>> {
    let projects = provision.list_projects().await.ok()?;
    let project = projects.iter().find(|project| {
        project.get("project_code").and_then(Value::as_str) == Some(project_code)
    })?;
    let project_id = project
        .get("id")
        .or_else(|| project.get("project_id"))
        .and_then(Value::as_str)?;

    let full_schema = provision.get_graph_schema(project_id).await.ok()?;
    let nodes = full_schema.get("nodes")?;

    let mut guide = Map::new();
    extract_field_guide(nodes, &mut guide);
    (!guide.is_empty()).then_some(guide)
}

/// Recursively extract field info from the full graph schema.
///
/// Node types may nest specializations alongside their `schema` key
/// (e.g. Topic → TechnicalTopic → ProgrammingLanguage); each level with a
/// `schema` contributes its own entry.
fn extract_field_guide(nodes_schema: &Value, field_guide: &mut Map<String, Value>) {
    let Some(nodes) = nodes_schema.as_object() else {
        return;
    };

    for (key, val) in nodes {
        let Some(val_obj) = val.as_object() else {
            continue;
        };
        let Some(schema) = val_obj.get("schema").and_then(Value::as_object) else {
            continue;
        };

        let mut fields = Map::new();
        for (field_name, field_def) in schema {
            let field_type = field_def
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("string");
            let required = field_def
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let rendered = if required {
                format!("{field_type} (REQUIRED)")
            } else {
                field_type.to_string()
            };
            fields.insert(field_name.clone(), Value::String(rendered));
        }
        field_guide.insert(key.to_lowercase(), Value::Object(fields));

        for (nested_key, nested_val) in val_obj {
            if nested_val
                .as_object()
                .is_some_and(|nested| nested.contains_key("schema"))
            {
                let mut nested = Map::new();
                nested.insert(nested_key.clone(), nested_val.clone());
                extract_field_guide(&Value::Object(nested), field_guide);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Value {
        json!({
            "entities": {
                "topic": { "path": "Topic" },
                "article": { "path": "Article" },
            },
            "relationships": {
                "covers": {
                    "type_name": "COVERS",
                    "from_path": "Article",
                    "to_path": "Topic",
                },
                "authored": {},
            },
        })
    }

    #[test]
    fn test_build_extraction_guide() {
        let (entities, relationships) = build_extraction_guide(&sample_schema());

        assert_eq!(entities.len(), 2);
        assert_eq!(entities["topic"], json!({ "path": "Topic" }));

        assert_eq!(relationships.len(), 2);
        assert_eq!(relationships["covers"]["type_name"], json!("COVERS"));
        assert_eq!(relationships["covers"]["from"], json!("Article"));
        // type_name falls back to the uppercased key
        assert_eq!(relationships["authored"]["type_name"], json!("AUTHORED"));
    }

    #[test]
    fn test_extraction_instructions_name_the_vocabulary() {
        let (entities, relationships) = build_extraction_guide(&sample_schema());
        let instructions = extraction_instructions(&entities, &relationships);

        assert!(instructions.contains("article, topic"));
        assert!(instructions.contains("authored, covers"));
        assert!(instructions.contains("add_knowledge_nodes"));
        assert!(instructions.contains("add_knowledge_relationships"));
    }

    #[test]
    fn test_extract_field_guide_recurses_nested_types() {
        let nodes = json!({
            "Topic": {
                "schema": {
                    "name": { "type": "string", "required": true },
                    "description": { "type": "string" },
                },
                "TechnicalTopic": {
                    "schema": {
                        "domain": { "type": "string", "required": true },
                    },
                },
            },
        });

        let mut guide = Map::new();
        extract_field_guide(&nodes, &mut guide);

        assert_eq!(guide["topic"]["name"], json!("string (REQUIRED)"));
        assert_eq!(guide["topic"]["description"], json!("string"));
        assert_eq!(guide["technicaltopic"]["domain"], json!("string (REQUIRED)"));
    }

    #[test]
    fn test_extract_field_guide_ignores_non_objects() {
        let mut guide = Map::new();
        extract_field_guide(&json!("not an object"), &mut guide);
        assert!(guide.is_empty());
    }
}
