//! Session record and the storage contract

use super::message::{Message, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque unique session identifier
    pub id: String,
    /// Ordered message history, starting with the system directive
    pub messages: Vec<Message>,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new record from a well-formed history
    pub fn new(id: impl Into<String>, messages: Vec<Message>) -> crate::Result<Self> {
        validate_history(&messages)?;
        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            messages,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the whole history
    pub fn replace_messages(&mut self, messages: Vec<Message>) -> crate::Result<()> {
        validate_history(&messages)?;
        self.messages = messages;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Check the history invariant: never empty, first message is the system directive
pub fn validate_history(messages: &[Message]) -> crate::Result<()> {
    match messages.first() {
        None => Err(crate::Error::Validation(
            "session history must not be empty".to_string(),
        )),
        Some(first) if first.role() != Role::System => Err(crate::Error::Validation(format!(
            "session history must start with a system message, found {}",
            first.role()
        ))),
        Some(_) => Ok(()),
    }
}

/// Durable keyed storage of session histories.
///
/// Stores are shared process-wide and accessed concurrently; every write is a
/// full overwrite of the history (last writer wins, no merging).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session.
    ///
    /// Fails with [`crate::Error::DuplicateSession`] if the identifier exists.
    async fn create(&self, id: &str, history: &[Message]) -> crate::Result<()>;

    /// Fetch the stored history.
    ///
    /// Fails with [`crate::Error::SessionNotFound`] if the identifier is unknown.
    async fn get(&self, id: &str) -> crate::Result<Vec<Message>>;

    /// Overwrite the stored history.
    ///
    /// Fails with [`crate::Error::SessionNotFound`] if the identifier is unknown.
    async fn replace(&self, id: &str, history: &[Message]) -> crate::Result<()>;
}
