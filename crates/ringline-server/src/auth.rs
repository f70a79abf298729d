use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use ringline_mcp::jsonrpc::UNAUTHORIZED;
use ringline_mcp::JsonRpcResponse;

use crate::app_state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `x-api-key` does not match the configured secret.
///
/// With no secret configured every request is rejected.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match (state.config.api_key.as_deref(), presented) {
        (Some(expected), Some(presented)) if expected == presented => next.run(req).await,
        (None, _) => {
            tracing::warn!(path = %req.uri().path(), "no API key configured, rejecting request");
            unauthorized()
        }
        _ => {
            tracing::warn!(path = %req.uri().path(), "missing or invalid API key");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    let body = JsonRpcResponse::error(
        Value::Null,
        UNAUTHORIZED,
        "Unauthorized: missing or invalid x-api-key header",
    );
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
