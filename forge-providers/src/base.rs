//! Base trait for completion providers

use async_trait::async_trait;
use forge_core::config::ProviderConfig;
use forge_core::session::Message;
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request never produced an HTTP response (connection, DNS, timeout)
    /// or the response body could not be read
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("Provider error {code}: {reason}")]
    Provider { code: u16, reason: String },

    /// A success response without a usable reply
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Whether the failure happened before the provider produced an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Fixed sampling settings applied to every completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

impl From<&ProviderConfig> for CompletionSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Sends an ordered history to a language model and returns its reply
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete the conversation.
    ///
    /// Returns the first generated reply trimmed of surrounding whitespace.
    /// Failures are returned as-is; implementations never retry.
    async fn complete(&self, history: &[Message]) -> ProviderResult<String>;

    /// Model identifier used for every call
    fn model(&self) -> &str;
}
