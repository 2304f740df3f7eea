//! In-process session store

use super::message::Message;
use super::store::{SessionRecord, SessionStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Session store backed by a process-local map.
///
/// State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        let record = SessionRecord::new(id, history.to_vec())?;
        let mut sessions = self.sessions.write();
        if sessions.contains_key(id) {
            return Err(crate::Error::DuplicateSession(id.to_string()));
        }
        sessions.insert(id.to_string(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> crate::Result<Vec<Message>> {
        self.sessions
            .read()
            .get(id)
            .map(|record| record.messages.clone())
            .ok_or_else(|| crate::Error::SessionNotFound(id.to_string()))
    }

    async fn replace(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        let mut sessions = self.sessions.write();
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| crate::Error::SessionNotFound(id.to_string()))?;
        record.replace_messages(history.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening() -> Vec<Message> {
        vec![
            Message::system("You are a game master."),
            Message::assistant("Welcome, captain."),
        ]
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let store = MemorySessionStore::new();
        store.create("a", &opening()).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), opening());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate() {
        let store = MemorySessionStore::new();
        store.create("a", &opening()).await.unwrap();

        let err = store.create("a", &opening()).await.unwrap_err();
        assert!(matches!(err, crate::Error::DuplicateSession(id) if id == "a"));
    }

    #[tokio::test]
    async fn test_get_and_replace_unknown_session() {
        let store = MemorySessionStore::new();

        assert!(matches!(
            store.get("missing").await,
            Err(crate::Error::SessionNotFound(_))
        ));
        assert!(matches!(
            store.replace("missing", &opening()).await,
            Err(crate::Error::SessionNotFound(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_replace_overwrites_history() {
        let store = MemorySessionStore::new();
        store.create("a", &opening()).await.unwrap();

        let mut history = opening();
        history.push(Message::user("Set a course for Vega."));
        history.push(Message::assistant("Course laid in."));
        store.replace("a", &history).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), history);
    }
}
