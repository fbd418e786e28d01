//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::websocket::WebSocketState;

/// State shared across all request handlers and background tasks
///
/// The registry is owned here and handed around by explicit injection;
/// there is no process-global instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ws_state: WebSocketState,
}

impl AppState {
    /// Create application state from loaded configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            ws_state: WebSocketState::new(),
        }
    }
}
