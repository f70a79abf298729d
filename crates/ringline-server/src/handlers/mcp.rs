use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use ringline_mcp::jsonrpc::{parse_request, INVALID_REQUEST, PARSE_ERROR};

use crate::app_state::AppState;

/// Handle one MCP JSON-RPC request.
///
/// Malformed envelopes answer 400; notifications answer 202 with no body.
pub async fn mcp_request(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(err) => {
            tracing::info!(code = ?err.error_code(), "rejected MCP request");
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    tracing::debug!(method = %req.method, "MCP request");
    let Some(response) = state.mcp.handle(req).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let status = match response.error_code() {
        Some(INVALID_REQUEST | PARSE_ERROR) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(response)).into_response()
}
