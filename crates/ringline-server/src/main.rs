use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ringline_core::Config;
use ringline_server::app_state::AppState;
use ringline_vonage::VonageGateway;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("RINGLINE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());

    let config = Arc::new(Config::from_env());
    if config.application_id.is_none() {
        tracing::warn!("VONAGE_APPLICATION_ID is not set; provider tools will fail");
    }
    if config.api_key.is_none() {
        tracing::warn!("no API key configured; every protected request will be rejected");
    }

    let gateway = VonageGateway::new(config.clone()).expect("Failed to build HTTP client");
    let state = AppState::new(config, Arc::new(gateway));

    let app = ringline_server::router::create_router(state);

    let addr = format!("{host}:{port}");
    tracing::info!("ringline server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
