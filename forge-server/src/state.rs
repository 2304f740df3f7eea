use forge_engine::SessionEngine;
use std::sync::Arc;

/// Shared handler state; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SessionEngine>,
}

impl AppState {
    pub fn new(engine: SessionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
