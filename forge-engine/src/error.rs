//! Error types returned by the session engine

use forge_providers::ProviderError;
use thiserror::Error;

/// Failure of a session operation
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required caller-supplied field was missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No session exists under the identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The generated identifier collided with a stored session
    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    /// The completion call failed
    #[error(transparent)]
    Completion(#[from] ProviderError),

    /// The session store failed
    #[error("Storage failure: {0}")]
    Storage(forge_core::Error),
}

/// Coarse failure category used by front ends to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    SessionNotFound,
    DuplicateSession,
    Transport,
    Provider,
    MalformedResponse,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidInput(_) => ErrorKind::InvalidInput,
            EngineError::SessionNotFound(_) => ErrorKind::SessionNotFound,
            EngineError::DuplicateSession(_) => ErrorKind::DuplicateSession,
            EngineError::Completion(ProviderError::Transport(_)) => ErrorKind::Transport,
            EngineError::Completion(ProviderError::Provider { .. }) => ErrorKind::Provider,
            EngineError::Completion(ProviderError::MalformedResponse(_)) => {
                ErrorKind::MalformedResponse
            }
            EngineError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether the failure came from the completion call
    pub fn is_completion(&self) -> bool {
        matches!(self, EngineError::Completion(_))
    }
}

impl From<forge_core::Error> for EngineError {
    fn from(e: forge_core::Error) -> Self {
        match e {
            forge_core::Error::SessionNotFound(id) => EngineError::SessionNotFound(id),
            forge_core::Error::DuplicateSession(id) => EngineError::DuplicateSession(id),
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_lifted() {
        let err: EngineError = forge_core::Error::SessionNotFound("abc".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);

        let err: EngineError = forge_core::Error::DuplicateSession("abc".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::DuplicateSession);

        let err: EngineError = forge_core::Error::Storage("disk full".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_completion_kinds() {
        let err = EngineError::from(ProviderError::Transport("refused".to_string()));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_completion());

        let err = EngineError::from(ProviderError::Provider {
            code: 500,
            reason: "Internal Server Error".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.to_string(), "Provider error 500: Internal Server Error");

        let err = EngineError::from(ProviderError::MalformedResponse("empty".to_string()));
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
