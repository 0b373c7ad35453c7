//! Ollama HTTP transport
//!
//! Provides the raw request/response plumbing over reqwest:
//! - `POST /api/chat` streamed (NDJSON body) and buffered
//! - `GET /api/version` health probe
//! - JSON helpers shared with the model directory
//!
//! Chat transports sit behind the `ChatTransport` trait so the streaming
//! pipeline can run against any source of body fragments.

use crate::errors::{ClientError, Result};
use crate::types::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Connection establishment timeout. Streams themselves are bounded by the
/// caller's deadline, not by the HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body fragments of a streamed response, in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Source of chat responses
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a streamed chat request and hand back the open response body
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream>;

    /// Send a buffered chat request and return the decoded response object
    async fn chat_once(&self, request: &ChatRequest) -> Result<Value>;
}

/// Ollama HTTP client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,

    /// Bound on buffered requests (`get_json`, `post_json`); streamed
    /// bodies are bounded by the caller's deadline instead
    request_timeout: Option<Duration>,
}

impl OllamaClient {
    /// Create client against the default local endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    /// Create client against a custom endpoint
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ClientError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        })
    }

    /// Fail buffered requests that take longer than `timeout`
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.endpoint("/api/version"))
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// `GET` a JSON document
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.bounded(self.client.get(self.endpoint(path))).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// `POST` a JSON body and decode the JSON reply
    pub async fn post_json<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self
            .bounded(self.client.post(self.endpoint(path)).json(body))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    fn bounded(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// Turn a non-2xx response into `ApiError`, preferring the server's
    /// `{"error": "..."}` message over the raw body
    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);

        Err(ClientError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatTransport for OllamaClient {
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| ClientError::StreamingError(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn chat_once(&self, request: &ChatRequest) -> Result<Value> {
        self.post_json("/api/chat", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = OllamaClient::with_base_url("http://localhost:11434/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.endpoint("/api/chat"), "http://localhost:11434/api/chat");
    }

    #[tokio::test]
    async fn test_request_timeout_bounds_silent_server() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = OllamaClient::with_base_url(&format!("http://{}", addr))
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));
        assert_eq!(client.request_timeout(), Some(Duration::from_millis(200)));

        let result = tokio::time::timeout(Duration::from_secs(5), client.get_json("/api/tags")).await;
        assert!(matches!(result, Ok(Err(ClientError::HttpError(_)))));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        // Port 9 (discard) is not an HTTP server
        let client = OllamaClient::with_base_url("http://127.0.0.1:9").unwrap();
        assert!(!client.health_check().await);
    }
}
