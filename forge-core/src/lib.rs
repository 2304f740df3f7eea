//! Core types and traits for adventure-forge
//!
//! This crate provides the message and session model, the session storage
//! contract with its backends, configuration loading and logging setup used
//! by all other adventure-forge components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
