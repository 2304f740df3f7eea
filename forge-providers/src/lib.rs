//! Chat-completion provider integrations for adventure-forge
//!
//! This crate defines the [`CompletionClient`] abstraction and an
//! implementation for OpenAI-compatible chat-completion endpoints.

pub mod base;
pub mod openai;

pub use base::{CompletionClient, CompletionSettings, ProviderError, ProviderResult};
pub use openai::OpenAiClient;
