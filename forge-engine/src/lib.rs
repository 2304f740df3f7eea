//! Session engine for adventure-forge
//!
//! This crate threads a session's message history through the completion
//! provider: it creates sessions from a genre, advances them one turn at a
//! time and writes the full history back to the session store.

pub mod directive;
pub mod engine;
pub mod error;
pub mod history;
pub mod locks;

pub use directive::build_system_directive;
pub use engine::{NewSession, SessionEngine};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use history::{FullHistory, HistoryStrategy, RecentWindow};
pub use locks::SessionLocks;
