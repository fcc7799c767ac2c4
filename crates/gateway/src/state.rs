use std::sync::Arc;

use nv_domain::config::ServerConfig;
use nv_providers::ChatProvider;
use nv_sessions::SessionManager;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<SessionManager>,
    /// Explicit provider implementation injected into every new session.
    /// `None` in production; tests use it to avoid live model calls.
    pub provider_override: Option<Arc<dyn ChatProvider>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionManager::new()),
            provider_override: None,
        }
    }
}
