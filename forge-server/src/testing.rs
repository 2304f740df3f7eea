use async_trait::async_trait;
use forge_core::session::{MemorySessionStore, Message};
use forge_engine::SessionEngine;
use forge_providers::{CompletionClient, ProviderResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::state::AppState;

/// Replays scripted results, then answers "ok"
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<ProviderResult<String>>>,
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _history: &[Message]) -> ProviderResult<String> {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn state_with_replies(
    replies: Vec<ProviderResult<String>>,
) -> (AppState, Arc<MemorySessionStore>) {
    let client = Arc::new(ScriptedClient {
        script: Mutex::new(replies.into()),
    });
    let store = Arc::new(MemorySessionStore::new());
    let state = AppState::new(SessionEngine::new(client, store.clone()));
    (state, store)
}
