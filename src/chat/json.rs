//! Structured-JSON chat
//!
//! Asks the server for `format: "json"` output with a capped length and
//! always hands back a JSON value. Failures of any kind become an
//! `{"error": ...}` object instead of an `Err`.

use super::ChatClient;
use crate::streaming::ChatTransport;
use crate::types::{ChatMessage, ChatRequest};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Error text for content that is not valid JSON
pub const PARSE_FAILED: &str = "parse failed";

/// Error text for empty or missing content
pub const NO_STRUCTURED_DATA: &str = "no structured data returned";

/// `{"error": message}`
pub fn error_payload(message: &str) -> Value {
    json!({ "error": message })
}

/// Whether `value` is one of the error payloads built here
pub fn is_error_payload(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.len() == 1 && map.get("error").map_or(false, Value::is_string))
        .unwrap_or(false)
}

/// Interpret the `message.content` field of a buffered chat reply
pub fn interpret_content(content: Option<&Value>) -> Value {
    match content {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            match serde_json::from_str::<Value>(text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Failed to parse JSON response: {}", e);
                    error_payload(PARSE_FAILED)
                }
            }
        }
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        Some(Value::Array(items)) if !items.is_empty() => Value::Array(items.clone()),
        _ => error_payload(NO_STRUCTURED_DATA),
    }
}

impl<T: ChatTransport> ChatClient<T> {
    /// Buffered chat constrained to JSON output.
    ///
    /// Never fails: transport errors, timeouts and unparseable content all
    /// come back as an error payload.
    pub async fn chat_json(&self, messages: &[ChatMessage]) -> Value {
        let request = ChatRequest::structured(
            self.config.model.clone(),
            messages.to_vec(),
            self.config.options.clone(),
            self.config.json_max_tokens,
        );
        if let Err(e) = request.validate() {
            return error_payload(&e.to_string());
        }

        let cancel = CancellationToken::new();
        match self
            .deadline
            .run(&cancel, self.transport.chat_once(&request))
            .await
        {
            Ok(response) => match response.get("message") {
                Some(message) => interpret_content(message.get("content")),
                None => {
                    warn!("Empty response received from structured chat");
                    error_payload(NO_STRUCTURED_DATA)
                }
            },
            Err(e) => {
                error!("Error fetching structured chat response: {}", e);
                error_payload(&e.to_string())
            }
        }
    }
}
