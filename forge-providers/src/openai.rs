//! OpenAI-compatible chat-completion client

use async_trait::async_trait;
use forge_core::config::ProviderConfig;
use forge_core::session::Message;
use forge_core::utils::preview;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::base::{CompletionClient, CompletionSettings, ProviderError, ProviderResult};

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

/// Chat completion response body, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {api_base}/chat/completions`
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    settings: CompletionSettings,
}

impl OpenAiClient {
    /// Create a client from the provider configuration.
    ///
    /// Fails if an extra header is not a valid HTTP header or the HTTP
    /// client cannot be built with the configured timeout.
    pub fn new(config: &ProviderConfig) -> forge_core::Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.extra_headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                forge_core::Error::Config(format!("invalid header name {:?}: {}", key, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                forge_core::Error::Config(format!("invalid value for header {:?}: {}", key, e))
            })?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            forge_core::Error::Config(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            settings: CompletionSettings::from(config),
        })
    }

    /// Settings sent with every request
    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Extract the first reply from a success body
    fn parse_reply(body: &str) -> ProviderResult<String> {
        let response: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON body: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        choice
            .message
            .and_then(|m| m.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("first choice has no message content".to_string())
            })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, history: &[Message]) -> ProviderResult<String> {
        let request = ChatCompletionRequest {
            model: &self.settings.model,
            messages: history,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            self.settings.model,
            history.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(
                "Completion endpoint returned HTTP {}: {}",
                status,
                preview(&error_text, 300)
            );
            return Err(ProviderError::Provider {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        Self::parse_reply(&body)
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}
