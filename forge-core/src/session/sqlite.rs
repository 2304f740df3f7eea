//! SQLite-backed session store

use super::message::Message;
use super::store::{validate_history, SessionStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Session store keeping one row per session in a SQLite table.
///
/// The history is stored as a JSON array in the `messages` column.
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteSessionStore {
    /// Open (or create) the database file and ensure the session table exists
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?, table)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(table: &str) -> crate::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> crate::Result<Self> {
        if !is_identifier(table) {
            return Err(crate::Error::Config(format!(
                "invalid collection name for sqlite table: {:?}",
                table
            )));
        }

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                id TEXT PRIMARY KEY,
                messages TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"
        ))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: table.to_string(),
        })
    }

    async fn run<T, F>(&self, op: F) -> crate::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> crate::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn, &table)
        })
        .await
        .map_err(|e| crate::Error::Internal(format!("sqlite task failed: {}", e)))?
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        validate_history(history)?;
        let id = id.to_string();
        let messages = serde_json::to_string(history)?;

        self.run(move |conn, table| {
            let now = Utc::now().to_rfc3339();
            let inserted = conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO \"{table}\" (id, messages, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)"
                ),
                params![id, messages, now],
            )?;
            if inserted == 0 {
                return Err(crate::Error::DuplicateSession(id));
            }
            debug!("Inserted session {} into {}", id, table);
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> crate::Result<Vec<Message>> {
        let id = id.to_string();
        self.run(move |conn, table| {
            let raw: Option<String> = conn
                .query_row(
                    &format!("SELECT messages FROM \"{table}\" WHERE id = ?1"),
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let raw = raw.ok_or(crate::Error::SessionNotFound(id))?;
            Ok(serde_json::from_str(&raw)?)
        })
        .await
    }

    async fn replace(&self, id: &str, history: &[Message]) -> crate::Result<()> {
        validate_history(history)?;
        let id = id.to_string();
        let messages = serde_json::to_string(history)?;

        self.run(move |conn, table| {
            let updated = conn.execute(
                &format!("UPDATE \"{table}\" SET messages = ?2, updated_at = ?3 WHERE id = ?1"),
                params![id, messages, Utc::now().to_rfc3339()],
            )?;
            if updated == 0 {
                return Err(crate::Error::SessionNotFound(id));
            }
            Ok(())
        })
        .await
    }
}
