//! Facade integration tests against an in-process mock backend.
//!
//! The mock runs on a loopback axum server with per-route call counters, so
//! these tests pin the retry policy (reads retried, writes attempted exactly
//! once), the timeout mapping, the error taxonomy, and the end-to-end
//! provision → ingest-schema → bulk-write flow.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use graforest::auth::ApiKey;
use graforest::backend::graph::GraphClient;
use graforest::backend::provision::ProvisionClient;
use graforest::config::Config;
use graforest::error::GatewayError;
use graforest::models::{EntityRecord, Environment};

fn key() -> ApiKey {
    ApiKey::parse(Some("gf_sk_0123456789abcdef0123456789abcdef")).unwrap()
}

fn test_config(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.graph.staging = format!("http://{addr}/{{project}}");
    config.provision.url = format!("http://{addr}");
    config.provision.key = Some("rb_sk_0123456789abcdef0123456789abcdef".to_string());
    config.policy.retry_backoff_ms = 1;
    config.policy.request_timeout_secs = 1;
    config.policy.provision_timeout_secs = 1;
    config.policy.provision_poll_secs = 1;
    config.policy.provision_wait_secs = 30;
    config
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn entity(entity_id: &str, entity_type: &str) -> EntityRecord {
    let mut properties = Map::new();
    properties.insert("name".to_string(), json!(entity_id));
    EntityRecord {
        entity_id: entity_id.to_string(),
        entity_type: entity_type.to_string(),
        properties,
    }
}

#[tokio::test]
async fn read_retries_transient_failures_then_succeeds() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/chem101/schema",
        get(move || {
            let calls = Arc::clone(&counter);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::SERVICE_UNAVAILABLE.into_response()
                } else {
                    Json(json!({ "entities": {}, "relationships": {} })).into_response()
                }
            }
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let schema = client
        .get_schema("chem101", Environment::Staging, &key())
        .await
        .unwrap();

    assert!(schema.get("entities").is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn read_surfaces_unavailable_after_retry_budget() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/chem101/schema",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::SERVICE_UNAVAILABLE.into_response() }
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let result = client
        .get_schema("chem101", Environment::Staging, &key())
        .await;

    assert!(matches!(
        result,
        Err(GatewayError::BackendUnavailable { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn write_is_attempted_exactly_once_under_fault() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/chem101/api/v1/data/bulk/nodes/topic",
        post(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::SERVICE_UNAVAILABLE.into_response() }
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let result = client
        .bulk_create_entities(
            "chem101",
            Environment::Staging,
            &key(),
            &[entity("machine-learning", "Topic")],
        )
        .await;

    assert!(matches!(
        result,
        Err(GatewayError::BackendUnavailable { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_read_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let router = Router::new().route(
        "/chem101/api/v1/nodes/topic/missing",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::NOT_FOUND.into_response() }
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let result = client
        .get_entity("chem101", Environment::Staging, &key(), "Topic", "missing")
        .await;

    match result {
        Err(GatewayError::BackendRejected { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "resource not found");
        }
        other => panic!("expected BackendRejected, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_backend_surfaces_timeout() {
    let router = Router::new().route(
        "/chem101/api/v1/data/stats",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({})).into_response()
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let result = client
        .get_statistics("chem101", Environment::Staging, &key())
        .await;

    assert!(matches!(result, Err(GatewayError::BackendTimeout { .. })));
}

#[tokio::test]
async fn search_preserves_backend_count_and_normalizes_nodes() {
    let router = Router::new().route(
        "/chem101/api/v1/data/search/text",
        post(|| async {
            Json(json!({
                "nodes": [
                    {
                        "entity_id": "iron-fe",
                        "hierarchical_path": "Topic:TechnicalTopic",
                        "name": "Iron",
                    },
                ],
                "count": 7,
                "query": "iron",
            }))
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let outcome = client
        .search_text("chem101", Environment::Staging, &key(), "iron")
        .await
        .unwrap();

    // The backend said 7 even though it returned one node; verbatim wins.
    assert_eq!(outcome.total, 7);
    assert_eq!(outcome.query, "iron");
    assert_eq!(outcome.nodes.len(), 1);
    assert_eq!(outcome.nodes[0].id, "iron-fe");
    assert_eq!(outcome.nodes[0].labels, vec!["TechnicalTopic"]);
}

#[tokio::test]
async fn repeated_read_is_idempotent() {
    let router = Router::new().route(
        "/chem101/api/v1/nodes/topic/iron-fe",
        get(|| async {
            Json(json!({
                "entity_id": "iron-fe",
                "name": "Iron",
                "description": "A metal",
            }))
        }),
    );
    let addr = spawn(router).await;
    let client = GraphClient::new(&test_config(addr)).unwrap();

    let first = client
        .get_entity("chem101", Environment::Staging, &key(), "Topic", "iron-fe")
        .await
        .unwrap();
    let second = client
        .get_entity("chem101", Environment::Staging, &key(), "Topic", "iron-fe")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("id"), Some(&json!("iron-fe")));
}

/// Mock provisioning endpoint: create → deploy → poll (running, completed) → info.
fn provisioning_router(poll_count: Arc<AtomicU32>) -> Router {
    Router::new().route(
        "/api/mcp/execute",
        post(move |Json(body): Json<Value>| {
            let poll_count = Arc::clone(&poll_count);
            async move {
                let tool = body.get("tool").and_then(Value::as_str).unwrap_or_default();
                let result = match tool {
                    "create_graph_project" => json!({ "id": "p-1", "name": "chem101" }),
                    "deploy_graph_staging" => json!({ "job_id": "j-1" }),
                    "get_job_status" => {
                        if poll_count.fetch_add(1, Ordering::SeqCst) == 0 {
                            json!({ "status": "running" })
                        } else {
                            json!({ "status": "completed" })
                        }
                    }
                    "get_graph_project_info" => json!({
                        "id": "p-1",
                        "project_code": "chem101",
                        "name": "chem101",
                        "status": "deployed",
                        "staging_url": "https://chem101-staging.rationalbloks.com",
                    }),
                    "delete_graph_project" => {
                        return Json(json!({
                            "success": false,
                            "error": "project p-1 has deletion protection enabled",
                        }));
                    }
                    other => json!({ "error": format!("unexpected tool {other}") }),
                };
                Json(json!({ "success": true, "result": result }))
            }
        }),
    )
}

#[tokio::test]
async fn provisioning_workflow_polls_to_completion() {
    let polls = Arc::new(AtomicU32::new(0));
    let addr = spawn(provisioning_router(Arc::clone(&polls))).await;
    let client = ProvisionClient::new(&test_config(addr)).unwrap();

    let info = client
        .provision_graph_project("chem101", None)
        .await
        .unwrap();

    assert_eq!(info.get("project_code"), Some(&json!("chem101")));
    assert!(polls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn provisioning_envelope_error_is_surfaced() {
    let addr = spawn(provisioning_router(Arc::new(AtomicU32::new(0)))).await;
    let client = ProvisionClient::new(&test_config(addr)).unwrap();

    let result = client.delete_graph_project("p-1").await;

    match result {
        Err(GatewayError::Provisioning { message }) => {
            assert!(message.contains("deletion protection"));
        }
        other => panic!("expected Provisioning error, got {other:?}"),
    }
}

#[tokio::test]
async fn provisioning_requires_service_key() {
    let mut config = test_config("127.0.0.1:9".parse().unwrap());
    config.provision.key = None;
    let client = ProvisionClient::new(&config).unwrap();

    let result = client.list_projects().await;
    assert!(matches!(result, Err(GatewayError::MissingServiceKey)));
}

#[tokio::test]
async fn end_to_end_provision_ingest_schema_bulk_write() {
    // One mock host plays both backends: provisioning under /api/mcp/execute,
    // the project's Graph API under /chem101/.
    let polls = Arc::new(AtomicU32::new(0));
    let bulk_calls = Arc::new(AtomicU32::new(0));
    let bulk_counter = Arc::clone(&bulk_calls);

    let router = provisioning_router(Arc::clone(&polls))
        .route(
            "/chem101/schema",
            get(|| async {
                Json(json!({
                    "entities": { "topic": { "path": "Topic" } },
                    "relationships": {
                        "covers": { "type_name": "COVERS", "from_path": "Article", "to_path": "Topic" },
                    },
                }))
            }),
        )
        .route(
            "/chem101/api/v1/data/bulk/nodes/topic",
            post(move |Json(body): Json<Value>| {
                bulk_counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let created = body
                        .get("nodes")
                        .and_then(Value::as_array)
                        .map(Vec::len)
                        .unwrap_or(0);
                    Json(json!({ "created": created }))
                }
            }),
        );
    let addr = spawn(router).await;
    let config = test_config(addr);

    // Step 1: provision the project.
    let provision = ProvisionClient::new(&config).unwrap();
    let info = provision
        .provision_graph_project("chem101", None)
        .await
        .unwrap();
    let project_code = info.get("project_code").and_then(Value::as_str).unwrap();

    // Step 2: the ingestion schema names the extraction vocabulary.
    let graph = GraphClient::new(&config).unwrap();
    let schema = graph
        .get_schema(project_code, Environment::Staging, &key())
        .await
        .unwrap();
    assert!(schema["entities"].get("topic").is_some());

    // Step 3: bulk-write the extracted entities; created count matches input.
    let entities: Vec<EntityRecord> = (0..3)
        .map(|n| entity(&format!("topic-{n}"), "Topic"))
        .collect();
    let created = graph
        .bulk_create_entities(project_code, Environment::Staging, &key(), &entities)
        .await
        .unwrap();

    assert_eq!(created.get("Topic"), Some(&3));
    assert_eq!(bulk_calls.load(Ordering::SeqCst), 1);
}
