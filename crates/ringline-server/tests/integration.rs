use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;

use ringline_core::Config;

use mock_gateway::MockGateway;

const SECRET: &str = "test-secret";

fn api_key() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(SECRET),
    )
}

fn build_test_app_with(config: Config) -> (TestServer, Arc<MockGateway>) {
    let gateway = Arc::new(MockGateway::new());
    let state = ringline_server::app_state::AppState::new(Arc::new(config), gateway.clone());
    let app = ringline_server::router::create_router(state);
    (TestServer::new(app).unwrap(), gateway)
}

fn build_test_app() -> (TestServer, Arc<MockGateway>) {
    build_test_app_with(Config {
        application_id: Some("app-123".to_string()),
        voice_from: Some("815012345678".to_string()),
        api_key: Some(SECRET.to_string()),
        ..Config::default()
    })
}

fn rpc(id: i64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

#[tokio::test]
async fn health_check_needs_no_secret() {
    let (server, _) = build_test_app();
    let resp = server.get("/health").await;
    resp.assert_status_ok();

    let body: Value = resp.json();
    assert_eq!(body, serde_json::json!({"status": "ok", "connected": true}));
}

#[tokio::test]
async fn missing_secret_is_rejected_on_every_protected_route() {
    let (server, gateway) = build_test_app();

    let resp = server
        .post("/mcp")
        .json(&rpc(1, "tools/list", Value::Null))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], -32000);
    assert!(body["id"].is_null());

    server
        .get("/mcp-tools")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/mcp-invoke")
        .json(&serde_json::json!({
            "tool": "send_sms",
            "params": {"to": "09012345678", "message": "hi"}
        }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(gateway.request_count(), 0);
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let (server, gateway) = build_test_app();

    let resp = server
        .post("/mcp")
        .add_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("not-the-secret"),
        )
        .json(&rpc(
            1,
            "tools/call",
            serde_json::json!({
                "name": "send_sms",
                "arguments": {"to": "09012345678", "message": "hi"}
            }),
        ))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(gateway.request_count(), 0);
}

#[tokio::test]
async fn unconfigured_secret_rejects_everything() {
    let (server, _) = build_test_app_with(Config::default());
    let (name, value) = api_key();

    server
        .get("/mcp-tools")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name.clone(), value.clone())
        .json(&rpc(1, "initialize", serde_json::json!({})))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["result"]["serverInfo"]["name"], "ringline");

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&rpc(2, "tools/list", Value::Null))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
}

#[tokio::test]
async fn notification_is_accepted_without_body() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    assert!(resp.as_bytes().is_empty());
}

#[tokio::test]
async fn notification_with_wrong_version_is_still_accepted_silently() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&serde_json::json!({"jsonrpc": "1.0", "method": "notifications/initialized"}))
        .await;

    resp.assert_status(StatusCode::ACCEPTED);
    assert!(resp.as_bytes().is_empty());
}

#[tokio::test]
async fn protocol_errors_use_jsonrpc_codes() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name.clone(), value.clone())
        .text("{not json")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());

    let resp = server
        .post("/mcp")
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({"jsonrpc": "1.0", "id": 3, "method": "ping"}))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 3);

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&rpc(4, "prompts/list", Value::Null))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test]
async fn send_sms_through_mcp() {
    let (server, gateway) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&rpc(
            5,
            "tools/call",
            serde_json::json!({
                "name": "send_sms",
                "arguments": {"to": "090-1234-5678", "message": "hello", "from": "Shop"}
            }),
        ))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["id"], 5);
    assert_eq!(body["result"]["isError"], false);
    assert_eq!(
        body["result"]["structuredContent"]["message_id"],
        "mock-message-1"
    );

    let sent = gateway.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "+819012345678");
    assert_eq!(sent[0].from, "Shop");
}

#[tokio::test]
async fn invalid_phone_is_a_failure_payload_not_a_protocol_error() {
    let (server, gateway) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp")
        .add_header(name, value)
        .json(&rpc(
            6,
            "tools/call",
            serde_json::json!({
                "name": "make_voice_call",
                "arguments": {"to": "12", "message": "hello"}
            }),
        ))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert!(body.get("error").is_none());
    assert_eq!(body["result"]["isError"], true);
    assert_eq!(
        body["result"]["content"][0]["text"],
        "Error: invalid phone number format. Please enter a valid number."
    );
    assert_eq!(gateway.request_count(), 0);
}

#[tokio::test]
async fn rest_tool_list_matches_registry() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server.get("/mcp-tools").add_header(name, value).await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "send_sms",
            "make_voice_call",
            "bulk_sms_from_csv",
            "get_call_status",
            "generate_jwt"
        ]
    );
}

#[tokio::test]
async fn rest_invoke_places_call_and_reads_status() {
    let (server, gateway) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp-invoke")
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({
            "tool": "make_voice_call",
            "params": {"to": "09012345678", "message": "テストです", "voice": "女性"}
        }))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["isError"], false);
    assert_eq!(body["structuredContent"]["voice"], "Mizuki");
    let call_id = body["structuredContent"]["call_id"].as_str().unwrap().to_string();

    let calls = gateway.placed_calls();
    assert_eq!(calls[0].from, "815012345678");
    assert_eq!(calls[0].script[0].voice_name, "Mizuki");

    let resp = server
        .post("/mcp-invoke")
        .add_header(name, value)
        .json(&serde_json::json!({
            "tool": "get_call_status",
            "params": {"call_id": call_id}
        }))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["structuredContent"]["status"], "answered");
}

#[tokio::test]
async fn rest_invoke_requires_tool() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp-invoke")
        .add_header(name, value)
        .json(&serde_json::json!({"params": {}}))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body, serde_json::json!({"error": "Missing \"tool\" parameter"}));
}

#[tokio::test]
async fn rest_invoke_unknown_tool_is_failure_outcome() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp-invoke")
        .add_header(name, value)
        .json(&serde_json::json!({"tool": "send_fax", "params": {}}))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["isError"], true);
    assert_eq!(body["structuredContent"]["error"], "tool_not_found");
}

#[tokio::test]
async fn bulk_send_reports_rows_in_order() {
    let (server, gateway) = build_test_app();
    let (name, value) = api_key();

    let csv = "phone,from,message\n09011111111,VonageMCP,one\n\n123,VonageMCP,bad\n09022222222,VonageMCP,two\n";
    let resp = server
        .post("/mcp-invoke")
        .add_header(name, value)
        .json(&serde_json::json!({
            "tool": "bulk_sms_from_csv",
            "params": {"csv_content": csv}
        }))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    let data = &body["structuredContent"];
    assert_eq!(data["total_rows"], 3);
    assert_eq!(data["sent"], 2);
    assert_eq!(data["invalid_rows"][0]["row"], 2);

    let sent: Vec<String> = gateway
        .sent_messages()
        .iter()
        .map(|m| m.to.to_string())
        .collect();
    assert_eq!(sent, vec!["+819011111111", "+819022222222"]);
}

#[tokio::test]
async fn generate_jwt_through_rest() {
    let (server, _) = build_test_app();
    let (name, value) = api_key();

    let resp = server
        .post("/mcp-invoke")
        .add_header(name, value)
        .json(&serde_json::json!({"tool": "generate_jwt", "params": {"subject": "alice"}}))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["structuredContent"]["token"], "mock-token-for-alice");
    assert_eq!(body["structuredContent"]["subject"], "alice");
}
