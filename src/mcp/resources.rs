//! Static documentation resources and prompt definitions.

use rmcp::model::{
    Annotated, GetPromptResult, Prompt, PromptArgument, PromptMessage, PromptMessageRole,
    RawResource,
};

/// URI of the getting-started guide.
pub const GETTING_STARTED_URI: &str = "graforest://docs/getting-started";

/// URI of the knowledge graph guide.
pub const KNOWLEDGE_GRAPH_URI: &str = "graforest://docs/knowledge-graph";

const DOCS_GETTING_STARTED: &str = r#"# Getting Started with Graforest

## Quick Start

1. Get your API key from https://graforest.ai/settings
2. Set environment variable: export GRAFOREST_GATEWAY_KEY=gf_sk_...
3. Run the gateway: graforest mcp

## Tools (13 total)

Graforest provides 13 knowledge graph tools:

- **Provisioning** (3 tools): Create, list, delete knowledge graphs
- **Data Write** (2 tools): Bulk create nodes, bulk create relationships
- **Data Read** (6 tools): Search, traverse, list, get, schema, statistics
- **Ingestion** (1 tool): Text → extraction instructions (3-call workflow)
- **Utility** (1 tool): Fetch URL content for ingestion

## 3-Call Ingestion Workflow (Recommended)

1. `ingest_text_content(project_code, text)` → returns schema + instructions
2. Extract ALL entities and relationships from the text in one pass
3. `add_knowledge_nodes(project_code, entities)` → bulk create all nodes
4. `add_knowledge_relationships(project_code, relationships)` → bulk create all edges

## Need Help?

Visit https://graforest.ai/docs for full documentation.
"#;

const DOCS_KNOWLEDGE_GRAPH: &str = r#"# Knowledge Graph Guide

## What is a Knowledge Graph?

A knowledge graph is a structured representation of facts:
- **Nodes** (entities): People, concepts, topics, articles
- **Relationships** (edges): Connections between entities

## Entity Types

Your graph schema defines available entity types. Common patterns:
- Topic, Concept, Article, Author, Person, Organization
- Each type has specific fields (name, description, etc.)

## Relationship Types

Defined in schema with from/to entity types:
- AUTHORED: Author → Article
- COVERS: Article → Topic
- PREREQUISITE_OF: Concept → Concept

## Best Practices

1. Use `get_knowledge_schema` first to see available types
2. Use kebab-case entity IDs: 'machine-learning', 'iron-fe'
3. Extract thoroughly — more entities = richer graph
4. Always create relationships between related entities
"#;

/// The static documentation resources the server announces.
pub fn static_resources() -> Vec<Annotated<RawResource>> {
    [
        (GETTING_STARTED_URI, "Getting Started Guide"),
        (KNOWLEDGE_GRAPH_URI, "Knowledge Graph Guide"),
    ]
    .into_iter()
    .map(|(uri, name)| {
        Annotated::new(
            RawResource {
                uri: uri.into(),
                name: name.into(),
                title: None,
                description: Some(format!("Documentation: {name}")),
                mime_type: Some("text/markdown".into()),
                size: None,
                icons: None,
            },
            None,
        )
    })
    .collect()
}

/// Look up the text of a static resource by URI.
pub fn read_static_resource(uri: &str) -> Option<&'static str> {
    match uri {
        GETTING_STARTED_URI => Some(DOCS_GETTING_STARTED),
        KNOWLEDGE_GRAPH_URI => Some(DOCS_KNOWLEDGE_GRAPH),
        _ => None,
    }
}

/// The prompts the server announces.
pub fn prompt_catalogue() -> Vec<Prompt> {
    vec![
        Prompt::new(
            "ingest-content",
            Some(
                "Ingest text content into a knowledge graph using the 3-call workflow. \
                 Extracts entities and relationships from the provided text.",
            ),
            Some(vec![
                PromptArgument {
                    name: "project_code".into(),
                    title: None,
                    description: Some("Project code for the target knowledge graph".into()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "text".into(),
                    title: None,
                    description: Some("Text content to extract knowledge from".into()),
                    required: Some(true),
                },
            ]),
        ),
        Prompt::new(
            "explore-graph",
            Some(
                "Explore a knowledge graph — get statistics, search for concepts, \
                 and traverse connections.",
            ),
            Some(vec![
                PromptArgument {
                    name: "project_code".into(),
                    title: None,
                    description: Some("Project code for the knowledge graph to explore".into()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "topic".into(),
                    title: None,
                    description: Some("Optional topic or concept to start exploring from".into()),
                    required: Some(false),
                },
            ]),
        ),
    ]
}

/// Build the ingest-content prompt for a project and text block.
pub fn ingest_prompt(project_code: &str, text: &str) -> GetPromptResult {
    GetPromptResult {
        description: Some("Knowledge ingestion workflow".into()),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Ingest the following content into knowledge graph '{project_code}'.\n\n\
                 Use the 3-call workflow:\n\
                 1. Call ingest_text_content with the text below\n\
                 2. Extract ALL entities and relationships from it\n\
                 3. Call add_knowledge_nodes with all entities\n\
                 4. Call add_knowledge_relationships with all relationships\n\n\
                 Be thorough — extract every entity and connection you can find.\n\n\
                 ---\n\n{text}"
            ),
        )],
    }
}

/// Build the explore-graph prompt, optionally anchored on a topic.
pub fn explore_prompt(project_code: &str, topic: Option<&str>) -> GetPromptResult {
    let mut steps = format!(
        "Explore knowledge graph '{project_code}':\n\n\
         1. Call get_knowledge_statistics to see what's in the graph\n\
         2. Call get_knowledge_schema to understand the data model\n"
    );
    match topic {
        Some(topic) if !topic.is_empty() => {
            steps.push_str(&format!(
                "3. Call search_knowledge_graph for '{topic}'\n\
                 4. Pick an interesting result and call traverse_knowledge_graph\n\
                 5. Summarize what you found and the connections\n"
            ));
        }
        _ => {
            steps.push_str(
                "3. List entities for the most populated type\n\
                 4. Pick an interesting entity and traverse its connections\n\
                 5. Summarize the graph's contents and structure\n",
            );
        }
    }

    GetPromptResult {
        description: Some("Knowledge graph exploration workflow".into()),
        messages: vec![PromptMessage::new_text(PromptMessageRole::User, steps)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resources_resolve() {
        for resource in static_resources() {
            assert!(read_static_resource(&resource.uri).is_some());
        }
        assert!(read_static_resource("graforest://docs/unknown").is_none());
    }

    #[test]
    fn test_ingest_prompt_contains_workflow() {
        let result = ingest_prompt("abc12345", "Iron is a metal.");
        assert_eq!(result.messages.len(), 1);
        let rendered = serde_json::to_string(&result).unwrap();
        assert!(rendered.contains("ingest_text_content"));
        assert!(rendered.contains("add_knowledge_nodes"));
        assert!(rendered.contains("Iron is a metal."));
    }

    #[test]
    fn test_explore_prompt_with_and_without_topic() {
        let with_topic = serde_json::to_string(&explore_prompt("abc", Some("chemistry"))).unwrap();
        assert!(with_topic.contains("search_knowledge_graph"));
        assert!(with_topic.contains("chemistry"));

        let without = serde_json::to_string(&explore_prompt("abc", None)).unwrap();
        assert!(without.contains("most populated type"));
    }
}
