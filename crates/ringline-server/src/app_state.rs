use std::sync::Arc;

use ringline_core::{Config, ProviderGateway};
use ringline_mcp::{Dispatcher, McpServer};

/// Shared application state with injected dependencies.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mcp: McpServer,
}

impl AppState {
    pub fn new(config: Arc<Config>, gateway: Arc<dyn ProviderGateway>) -> Self {
        let mcp = McpServer::new(Dispatcher::new(config.clone(), gateway));
        Self { config, mcp }
    }
}
