//! Session management for conversation history
//!
//! A session is an ordered, append-only list of role-tagged messages that
//! starts with exactly one system directive. Durable state is owned by a
//! [`SessionStore`]; callers hold a copy only for the length of one turn and
//! write it back with a full overwrite.

pub mod jsonl;
pub mod memory;
pub mod message;
pub mod sqlite;
pub mod store;

pub use jsonl::JsonlSessionStore;
pub use memory::MemorySessionStore;
pub use message::{Message, Role};
pub use sqlite::SqliteSessionStore;
pub use store::{SessionRecord, SessionStore};

use crate::config::{StorageBackend, StorageConfig};
use std::sync::Arc;
use tracing::info;

/// Open the session store selected by the storage configuration
pub fn open_store(config: &StorageConfig) -> crate::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
        StorageBackend::Jsonl => Arc::new(JsonlSessionStore::new(
            crate::config::expand_tilde(&config.uri),
            &config.database,
            &config.collection,
        )),
        StorageBackend::Sqlite => Arc::new(SqliteSessionStore::open(
            crate::config::expand_tilde(&config.uri),
            &config.collection,
        )?),
    };
    info!("Opened {} session store", config.backend);
    Ok(store)
}
