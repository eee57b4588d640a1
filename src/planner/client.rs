/// Reasoning-service client abstraction and the Anthropic implementation
///
/// The client is an explicitly constructed, injectable instance owned by the
/// plan generator - no process-wide singleton - so tests can substitute a
/// double and different configurations can run concurrently.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// One completion request to the reasoning service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Failure classes for reasoning-service calls, status-coded
///
/// The generator retries only `RateLimited` and `Server`; authentication and
/// malformed-request failures fail immediately.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Whether the generator may retry this failure with backoff
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ClientError::RateLimited { .. } | ClientError::Server { .. }
        )
    }
}

/// Anything that can complete a planning prompt into raw text
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ClientError>;
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn classify_status(status: StatusCode, message: String) -> ClientError {
        match status.as_u16() {
            401 | 403 => ClientError::Auth(message),
            429 => ClientError::RateLimited { retry_after: None },
            400 => ClientError::InvalidRequest(message),
            code if code >= 500 => ClientError::Server {
                status: code,
                message,
            },
            code => ClientError::Server {
                status: code,
                message,
            },
        }
    }
}

#[async_trait]
impl ReasoningClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ClientError> {
        let mut payload = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if let Some(system) = &request.system {
            payload["system"] = Value::String(system.clone());
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ClientError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, message));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        // First content block must be text
        let text = body
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| blocks.first())
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .and_then(|block| block.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| ClientError::Malformed("no text content block".into()))?;

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_and_server_errors_are_retriable() {
        assert!(ClientError::RateLimited { retry_after: Some(2) }.is_retriable());
        assert!(ClientError::Server {
            status: 529,
            message: "overloaded".into()
        }
        .is_retriable());

        assert!(!ClientError::Auth("bad key".into()).is_retriable());
        assert!(!ClientError::InvalidRequest("bad payload".into()).is_retriable());
        assert!(!ClientError::Network("connection reset".into()).is_retriable());
        assert!(!ClientError::Malformed("no text".into()).is_retriable());
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            AnthropicClient::classify_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Auth(_)
        ));
        assert!(matches!(
            AnthropicClient::classify_status(StatusCode::BAD_REQUEST, String::new()),
            ClientError::InvalidRequest(_)
        ));
        assert!(matches!(
            AnthropicClient::classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            ClientError::Server { status: 500, .. }
        ));
    }
}
