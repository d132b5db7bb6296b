//! Fluree tools against a mock Fluree server.

use std::time::Duration;

use fluree_mcp_server::core::session::ConnectionContext;
use fluree_mcp_server::domains::tools::ToolRegistry;
use fluree_mcp_server::domains::tools::definitions::FlureeClient;
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry() -> ToolRegistry {
    ToolRegistry::with_default_tools(FlureeClient::new(Duration::from_secs(5)))
        .expect("default tools register")
}

fn context(server: &MockServer, dataset: &str) -> ConnectionContext {
    ConnectionContext::new(Some(server.uri()), Some("acme"), Some(dataset))
}

fn args(value: Value) -> Option<Map<String, Value>> {
    value.as_object().cloned()
}

fn text(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        RawContent::Text(t) => &t.text,
        _ => panic!("expected text content"),
    }
}

#[tokio::test]
async fn query_posts_flureeql_to_session_ledger() {
    let fluree = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fdb/acme/main/query"))
        .and(body_json(json!({"select": ["*"], "from": "_collection"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": 1, "name": "person"}])),
        )
        .expect(1)
        .mount(&fluree)
        .await;

    let result = registry()
        .dispatch("flureeQueryTool", args(json!({})), &context(&fluree, "main"))
        .await
        .unwrap();

    assert_ne!(result.is_error, Some(true));
    assert_eq!(
        result.structured_content,
        Some(json!({"data": [{"_id": 1, "name": "person"}]}))
    );
    assert!(text(&result).starts_with("Fluree Query Result"));
}

#[tokio::test]
async fn sessions_route_to_their_own_targets() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for (server, ledger) in [(&first, "one"), (&second, "two")] {
        Mock::given(method("POST"))
            .and(path(format!("/fdb/acme/{ledger}/block")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ledger": ledger})))
            .expect(1)
            .mount(server)
            .await;
    }

    let tools = registry();
    let a = tools
        .dispatch("flureeBlockQueryTool", args(json!({"block": 2})), &context(&first, "one"))
        .await
        .unwrap();
    let b = tools
        .dispatch("flureeBlockQueryTool", args(json!({"block": 2})), &context(&second, "two"))
        .await
        .unwrap();

    assert_eq!(a.structured_content, Some(json!({"ledger": "one"})));
    assert_eq!(b.structured_content, Some(json!({"ledger": "two"})));
}

#[tokio::test]
async fn downstream_failure_is_a_tool_result() {
    let fluree = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fdb/nw-state"))
        .respond_with(ResponseTemplate::new(503).set_body_string("raft not ready"))
        .mount(&fluree)
        .await;

    let result = registry()
        .dispatch("flureeNetworkStatus", None, &context(&fluree, "main"))
        .await
        .expect("downstream failures are not protocol errors");

    assert_eq!(result.is_error, Some(true));
    assert!(text(&result).contains("503"));
}

#[tokio::test]
async fn invalid_json_from_fluree_is_reported() {
    let fluree = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fdb/acme/main/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&fluree)
        .await;

    let result = registry()
        .dispatch("flureeHistoryQueryTool", None, &context(&fluree, "main"))
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
}

#[tokio::test]
async fn transact_creates_each_collection() {
    let fluree = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fdb/acme/main/transact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(3)
        .mount(&fluree)
        .await;

    let result = registry()
        .dispatch("flureeTransact", args(json!({"count": 3})), &context(&fluree, "main"))
        .await
        .unwrap();
    assert_ne!(result.is_error, Some(true));
}

#[tokio::test]
async fn new_keys_honors_request_method() {
    let fluree = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fdb/new-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "private": "pk",
            "public": "pub",
            "account-id": "acct"
        })))
        .expect(1)
        .mount(&fluree)
        .await;

    let result = registry()
        .dispatch("flureeNewKeysTool", args(json!({"method": "GET"})), &context(&fluree, "main"))
        .await
        .unwrap();
    assert_ne!(result.is_error, Some(true));
}

#[tokio::test]
async fn unreachable_fluree_is_reported() {
    let ctx = ConnectionContext::new(Some("http://127.0.0.1:9"), Some("acme"), Some("main"));
    let result = registry()
        .dispatch("flureeBlockRangeWithTxnTool", None, &ctx)
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
}
