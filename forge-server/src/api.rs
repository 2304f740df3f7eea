//! Route bodies shared by the axum router and the gateway dispatcher

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forge_engine::{EngineError, ErrorKind, SessionEngine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub genre: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: String,
    pub gm_reply: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub gm_reply: String,
}

/// An error response: a status code and a `{"error": ...}` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.message })
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match e.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::SessionNotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateSession => StatusCode::CONFLICT,
            ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Provider | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match e {
            EngineError::InvalidInput(message) => message,
            EngineError::SessionNotFound(_) => "Session not found.".to_string(),
            other => {
                if status.is_server_error() {
                    error!("Request failed: {}", other);
                }
                other.to_string()
            }
        };

        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

/// Parse a request body; an empty body reads as `{}`
pub fn parse_body<T: DeserializeOwned + Default>(raw: &[u8]) -> Result<T, ApiError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(raw).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

/// `POST /start`
pub async fn start_session(
    engine: &SessionEngine,
    request: StartRequest,
) -> Result<StartResponse, ApiError> {
    let started = engine.start(&request.genre).await?;
    Ok(StartResponse {
        session_id: started.session_id,
        gm_reply: started.reply,
    })
}

/// `POST /message`
pub async fn send_message(
    engine: &SessionEngine,
    request: MessageRequest,
) -> Result<MessageResponse, ApiError> {
    let gm_reply = engine
        .advance(&request.session_id, &request.user_message)
        .await?;
    Ok(MessageResponse { gm_reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_providers::ProviderError;

    #[test]
    fn test_parse_body_defaults_missing_fields() {
        let request: MessageRequest = parse_body(br#"{"sessionId":"abc"}"#).unwrap();
        assert_eq!(request.session_id, "abc");
        assert_eq!(request.user_message, "");

        let empty: StartRequest = parse_body(b"  ").unwrap();
        assert_eq!(empty.genre, "");
    }

    #[test]
    fn test_parse_body_rejects_invalid_json() {
        let err = parse_body::<StartRequest>(b"{genre").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Invalid JSON body"));

        let err = parse_body::<StartRequest>(br#"{"genre": 7}"#).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_engine_errors_map_to_status_codes() {
        let cases = [
            (EngineError::InvalidInput("Missing 'genre'.".to_string()), 400),
            (EngineError::SessionNotFound("x".to_string()), 404),
            (EngineError::DuplicateSession("x".to_string()), 409),
            (
                EngineError::Completion(ProviderError::Transport("refused".to_string())),
                503,
            ),
            (
                EngineError::Completion(ProviderError::Provider {
                    code: 401,
                    reason: "Unauthorized".to_string(),
                }),
                502,
            ),
            (
                EngineError::Completion(ProviderError::MalformedResponse("empty".to_string())),
                502,
            ),
            (
                EngineError::Storage(forge_core::Error::Storage("disk full".to_string())),
                500,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status.as_u16(), expected);
        }
    }

    #[test]
    fn test_error_messages_match_route_contract() {
        let err = ApiError::from(EngineError::SessionNotFound("abc".to_string()));
        assert_eq!(err.body(), serde_json::json!({"error": "Session not found."}));

        let err = ApiError::from(EngineError::InvalidInput(
            "Missing sessionId or userMessage.".to_string(),
        ));
        assert_eq!(err.message, "Missing sessionId or userMessage.");
    }
}
