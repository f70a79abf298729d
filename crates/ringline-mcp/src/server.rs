use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND,
};
use crate::tools::ToolRegistry;

pub const SERVER_NAME: &str = "ringline";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Answers MCP JSON-RPC methods. Shared by the stdio and HTTP transports.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications are never answered, not even with an error.
        if req.is_notification() {
            tracing::debug!(method = %req.method, "received notification");
            return None;
        }

        if req.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                req.id,
                INVALID_REQUEST,
                format!("Invalid Request: jsonrpc must be \"{JSONRPC_VERSION}\""),
            ));
        }

        let response = match req.method.as_str() {
            "initialize" => handle_initialize(&req),
            "tools/list" => handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => JsonRpcResponse::success(req.id.clone(), serde_json::json!({})),
            method => {
                tracing::debug!(method, "unknown method");
                JsonRpcResponse::error(
                    req.id.clone(),
                    METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                )
            }
        };
        Some(response)
    }

    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let Some(params) = &req.params else {
            return JsonRpcResponse::error(req.id.clone(), INVALID_PARAMS, "Missing params");
        };

        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                req.id.clone(),
                INVALID_PARAMS,
                "Missing 'name' parameter",
            );
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        let outcome = self.dispatcher.call(tool_name, arguments).await;
        JsonRpcResponse::success(req.id.clone(), outcome.to_call_result())
    }
}

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    JsonRpcResponse::success(
        req.id.clone(),
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_tools_list(req: &JsonRpcRequest) -> JsonRpcResponse {
    let tools = ToolRegistry::definitions();
    JsonRpcResponse::success(req.id.clone(), serde_json::json!({ "tools": tools }))
}
