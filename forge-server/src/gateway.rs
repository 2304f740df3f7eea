//! API-gateway style request dispatch.
//!
//! Serverless front ends hand over a single event record per request instead
//! of a socket. [`dispatch`] routes such an event through the same route
//! functions the HTTP server uses and returns a proxy-integration response.

use forge_engine::SessionEngine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::api::{self, parse_body, ApiError, MessageRequest, StartRequest};

/// Incoming proxy event. HTTP API v2 sets `rawPath`, REST APIs set `path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    #[serde(default)]
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl GatewayEvent {
    pub fn post(path: &str, body: serde_json::Value) -> Self {
        Self {
            http_method: "POST".to_string(),
            raw_path: Some(path.to_string()),
            path: None,
            body: Some(body.to_string()),
        }
    }

    /// `rawPath` if set and non-empty, else `path`
    pub fn route_path(&self) -> &str {
        self.raw_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(self.path.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON document serialized as a string
    pub body: String,
}

impl GatewayResponse {
    fn json(status_code: u16, body: &impl Serialize) -> Self {
        let body = serde_json::to_string(body)
            .unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e));
        let headers = HashMap::from([("content-type".to_string(), "application/json".to_string())]);
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Parse the body back into a JSON value
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

impl From<ApiError> for GatewayResponse {
    fn from(e: ApiError) -> Self {
        Self::json(e.status.as_u16(), &e.body())
    }
}

/// Route one gateway event
pub async fn dispatch(engine: &SessionEngine, event: &GatewayEvent) -> GatewayResponse {
    let path = event.route_path();
    let raw_body = event.body.as_deref().unwrap_or("{}");
    debug!("Gateway event {} {}", event.http_method, path);

    match (event.http_method.as_str(), path) {
        ("POST", "/start") => {
            let result = match parse_body::<StartRequest>(raw_body.as_bytes()) {
                Ok(request) => api::start_session(engine, request).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(response) => GatewayResponse::json(200, &response),
                Err(e) => e.into(),
            }
        }
        ("POST", "/message") => {
            let result = match parse_body::<MessageRequest>(raw_body.as_bytes()) {
                Ok(request) => api::send_message(engine, request).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(response) => GatewayResponse::json(200, &response),
                Err(e) => e.into(),
            }
        }
        _ => ApiError::not_found().into(),
    }
}
