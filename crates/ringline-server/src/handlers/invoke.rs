use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use ringline_mcp::ToolRegistry;

use crate::app_state::AppState;

/// List tool definitions without the JSON-RPC envelope.
pub async fn list_tools() -> Json<Value> {
    Json(serde_json::json!({ "tools": ToolRegistry::definitions() }))
}

/// Invoke a tool directly: `{tool, params}`.
pub async fn invoke_tool(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(tool) = body.get("tool").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Missing \"tool\" parameter" })),
        )
            .into_response();
    };

    let params = body
        .get("params")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));

    let outcome = state.mcp.dispatcher().call(tool, params).await;
    Json(outcome.to_call_result()).into_response()
}
