use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::{auth, handlers};

/// Create the main application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(handlers::mcp_request))
        .route("/mcp-tools", get(handlers::list_tools))
        .route("/mcp-invoke", post(handlers::invoke_tool))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        // Health check, no secret required
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        // CORS: allow any origin (MCP clients may run in various contexts)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
