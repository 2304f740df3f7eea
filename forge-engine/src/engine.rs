//! Session lifecycle: start a session, advance it one turn at a time

use crate::directive::build_system_directive;
use crate::error::{EngineError, EngineResult};
use crate::history::{FullHistory, HistoryStrategy, RecentWindow};
use crate::locks::SessionLocks;
use forge_core::config::EngineConfig;
use forge_core::session::{Message, SessionStore};
use forge_core::utils::preview;
use forge_providers::CompletionClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A freshly created session and the game master's opening reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: String,
    pub reply: String,
}

/// Threads session histories between the store and the completion client.
///
/// The engine keeps no session state of its own: each call fetches what it
/// needs, performs one completion call and writes the whole history back.
/// Nothing is persisted unless the completion call succeeded.
pub struct SessionEngine {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn SessionStore>,
    strategy: Arc<dyn HistoryStrategy>,
    locks: Option<SessionLocks>,
}

impl SessionEngine {
    /// Create an engine sending full histories without per-session locking
    pub fn new(client: Arc<dyn CompletionClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            strategy: Arc::new(FullHistory),
            locks: None,
        }
    }

    /// Create an engine configured by the `engine` config section
    pub fn from_config(
        config: &EngineConfig,
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let mut engine = Self::new(client, store);
        if let Some(window) = config.history_window {
            engine = engine.with_history_strategy(Arc::new(RecentWindow::new(window)));
        }
        if config.serialize_sessions {
            engine = engine.with_session_locks();
        }
        engine
    }

    /// Replace the strategy choosing which messages are sent to the provider
    pub fn with_history_strategy(mut self, strategy: Arc<dyn HistoryStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Serialize turns on the same session
    pub fn with_session_locks(mut self) -> Self {
        self.locks = Some(SessionLocks::new());
        self
    }

    /// Start a new session for `genre`.
    ///
    /// The session is only stored once the opening reply has been produced.
    pub async fn start(&self, genre: &str) -> EngineResult<NewSession> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(EngineError::InvalidInput("Missing 'genre'.".to_string()));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let mut history = vec![Message::system(build_system_directive(genre))];

        let reply = self.complete(&session_id, &history).await?;
        history.push(Message::assistant(reply.clone()));

        self.store.create(&session_id, &history).await?;
        info!("Started session {} (genre: {})", session_id, preview(genre, 60));

        Ok(NewSession { session_id, reply })
    }

    /// Advance a session by one turn and return the game master's reply.
    ///
    /// If the completion call fails the stored history is left as it was,
    /// including the player's message.
    pub async fn advance(&self, session_id: &str, user_message: &str) -> EngineResult<String> {
        let session_id = session_id.trim();
        let user_message = user_message.trim();
        if session_id.is_empty() || user_message.is_empty() {
            return Err(EngineError::InvalidInput(
                "Missing sessionId or userMessage.".to_string(),
            ));
        }

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(session_id).await),
            None => None,
        };

        let mut history = self.store.get(session_id).await?;
        history.push(Message::user(user_message));

        let reply = self.complete(session_id, &history).await?;
        history.push(Message::assistant(reply.clone()));

        self.store.replace(session_id, &history).await?;
        info!(
            "Advanced session {} to {} messages",
            session_id,
            history.len()
        );

        Ok(reply)
    }

    /// Read the stored history of a session
    pub async fn history(&self, session_id: &str) -> EngineResult<Vec<Message>> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(EngineError::InvalidInput("Missing sessionId.".to_string()));
        }
        Ok(self.store.get(session_id).await?)
    }

    async fn complete(&self, session_id: &str, history: &[Message]) -> EngineResult<String> {
        let outgoing = self.strategy.project(history);
        debug!(
            "Completing session {} with {}/{} messages on {}",
            session_id,
            outgoing.len(),
            history.len(),
            self.client.model()
        );

        self.client.complete(&outgoing).await.map_err(|e| {
            warn!("Completion failed for session {}: {}", session_id, e);
            EngineError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forge_core::session::{MemorySessionStore, Role};
    use forge_providers::{ProviderError, ProviderResult};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, history: &[Message]) -> ProviderResult<String> {
            let mut calls = self.calls.lock();
            calls.push(history.to_vec());
            Ok(format!("reply {}", calls.len()))
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn complete(&self, _history: &[Message]) -> ProviderResult<String> {
            Err(ProviderError::Provider {
                code: 503,
                reason: "Service Unavailable".to_string(),
            })
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_start_trims_genre_into_directive() {
        let client = Arc::new(RecordingClient::default());
        let store = Arc::new(MemorySessionStore::new());
        let engine = SessionEngine::new(client.clone(), store.clone());

        let started = engine.start("  pirate  ").await.unwrap();
        assert_eq!(started.reply, "reply 1");

        let calls = client.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].role(), Role::System);
        assert!(calls[0][0].content().contains("running a pirate role-playing"));
    }

    #[tokio::test]
    async fn test_start_failure_persists_nothing() {
        let store = Arc::new(MemorySessionStore::new());
        let engine = SessionEngine::new(Arc::new(FailingClient), store.clone());

        let err = engine.start("western").await.unwrap_err();
        assert!(err.is_completion());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_advance_trims_user_message() {
        let client = Arc::new(RecordingClient::default());
        let store = Arc::new(MemorySessionStore::new());
        let engine = SessionEngine::new(client.clone(), store.clone());

        let started = engine.start("heist").await.unwrap();
        engine
            .advance(&format!(" {} ", started.session_id), "  case the vault \n")
            .await
            .unwrap();

        let history = engine.history(&started.session_id).await.unwrap();
        assert_eq!(history[2], Message::user("case the vault"));
    }

    #[tokio::test]
    async fn test_window_limits_outgoing_but_not_stored_history() {
        let client = Arc::new(RecordingClient::default());
        let store = Arc::new(MemorySessionStore::new());
        let config = EngineConfig {
            history_window: Some(2),
            serialize_sessions: false,
        };
        let engine = SessionEngine::from_config(&config, client.clone(), store.clone());

        let started = engine.start("horror").await.unwrap();
        for turn in 0..3 {
            engine
                .advance(&started.session_id, &format!("turn {}", turn))
                .await
                .unwrap();
        }

        let last_call = client.calls.lock().last().cloned().unwrap();
        assert_eq!(last_call.len(), 3);
        assert_eq!(last_call[0].role(), Role::System);
        assert_eq!(last_call[2], Message::user("turn 2"));

        let stored = engine.history(&started.session_id).await.unwrap();
        assert_eq!(stored.len(), 8);
    }

    #[tokio::test]
    async fn test_history_requires_known_session() {
        let engine = SessionEngine::new(
            Arc::new(RecordingClient::default()),
            Arc::new(MemorySessionStore::new()),
        );
        assert!(matches!(
            engine.history("missing").await,
            Err(EngineError::SessionNotFound(_))
        ));
        assert!(matches!(
            engine.history(" ").await,
            Err(EngineError::InvalidInput(_))
        ));
    }
}
