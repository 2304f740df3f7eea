//! File-backed session store
//!
//! Each session lives in its own `<id>.jsonl` file: a metadata line followed
//! by one line per message, which keeps histories easy to read and diff.
//! Every write goes to a fresh temp file in the same directory which is then
//! moved into place, so readers only ever see complete files.

use super::message::Message;
use super::store::{validate_history, SessionRecord, SessionStore};
use crate::utils::safe_filename;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    CreateNew,
    Overwrite,
}

/// Session store writing JSONL files under `<root>/<database>/<collection>/`
#[derive(Debug, Clone)]
pub struct JsonlSessionStore {
    sessions_dir: PathBuf,
}

impl JsonlSessionStore {
    /// Create a store rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P, database: &str, collection: &str) -> Self {
        let sessions_dir = root
            .as_ref()
            .join(safe_filename(database))
            .join(safe_filename(collection));
        Self { sessions_dir }
    }

    /// Directory holding the session files
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Ids are used verbatim as file names, so only file-safe ids are stored
    fn is_storable_id(id: &str) -> bool {
        !id.is_empty() && safe_filename(id) == id
    }

    /// Get the file path for a session
    fn session_path(&self, id: &str) -> PathBuf {
        self.sessions_dir.join(format!("{}.jsonl", id))
    }

    fn encode(record: &SessionRecord) -> crate::Result<String> {
        let mut lines = Vec::with_capacity(record.messages.len() + 1);

        let metadata = serde_json::json!({
            "_type": "metadata",
            "id": record.id,
            "created_at": record.created_at.to_rfc3339(),
            "updated_at": record.updated_at.to_rfc3339(),
        });
        lines.push(serde_json::to_string(&metadata)?);

        for msg in &record.messages {
            lines.push(serde_json::to_string(msg)?);
        }

        let mut content = lines.join("\n");
        content.push('\n');
        Ok(content)
    }

    fn decode(id: &str, content: &str) -> crate::Result<SessionRecord> {
        let mut messages = Vec::new();
        let mut stored_id: Option<String> = None;
        let mut created_at: Option<DateTime<Utc>> = None;
        let mut updated_at: Option<DateTime<Utc>> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(line)?;
            if value.get("_type").and_then(|v| v.as_str()) == Some("metadata") {
                stored_id = value.get("id").and_then(|v| v.as_str()).map(String::from);
                created_at = value
                    .get("created_at")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok());
                updated_at = value
                    .get("updated_at")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok());
            } else {
                messages.push(serde_json::from_value::<Message>(value)?);
            }
        }

        if stored_id.as_deref() != Some(id) {
            return Err(crate::Error::SessionNotFound(id.to_string()));
        }
        validate_history(&messages)?;

        let now = Utc::now();
        Ok(SessionRecord {
            id: id.to_string(),
            messages,
            created_at: created_at.unwrap_or(now),
            updated_at: updated_at.unwrap_or(now),
        })
    }

    async fn load(&self, id: &str) -> crate::Result<SessionRecord> {
        if !Self::is_storable_id(id) {
            return Err(crate::Error::SessionNotFound(id.to_string()));
        }

        let path = self.session_path(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(crate::Error::SessionNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::decode(id, &content)
    }

    /// Write `record` to a private temp file and move it over the session file
    async fn write_record(&self, record: &SessionRecord, mode: WriteMode) -> crate::Result<()> {
        let content = Self::encode(record)?;
        let dir = self.sessions_dir.clone();
        let path = self.session_path(&record.id);

        let written = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(content.as_bytes())?;
            tmp.flush()?;
            match mode {
                WriteMode::CreateNew => tmp.persist_noclobber(&path).map_err(|e| e.error)?,
                WriteMode::Overwrite => tmp.persist(&path).map_err(|e| e.error)?,
            };
            Ok(path)
        })
        .await
        .map_err(|e| crate::Error::Internal(format!("session write task failed: {}", e)))?;

        match written {
            Ok(path) => {
                debug!(
                    "Wrote session file {} ({} messages)",
                    path.display(),
                    record.messages.len()
                );
                Ok(())
            }
            Err(e) if mode == WriteMode::CreateNew && e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(crate::Error::DuplicateSession(record.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    async fn create(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        if !Self::is_storable_id(id) {
            return Err(crate::Error::Validation(format!(
                "session id {:?} is not usable as a file name",
                id
            )));
        }
        let record = SessionRecord::new(id, history.to_vec())?;
        self.write_record(&record, WriteMode::CreateNew).await
    }

    async fn get(&self, id: &str) -> crate::Result<Vec<Message>> {
        Ok(self.load(id).await?.messages)
    }

    async fn replace(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        let mut record = self.load(id).await?;
        record.replace_messages(history.to_vec())?;
        self.write_record(&record, WriteMode::Overwrite).await
    }
}
