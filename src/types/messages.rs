//! Message types for chat requests
//!
//! Defines the conversation history sent to the model and the request
//! body for the `/api/chat` endpoint.

use crate::errors::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generation options passed through to the server (temperature, top_p, ...)
pub type GenerationOptions = Map<String, Value>;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

/// One entry of the conversation history, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request body for `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: GenerationOptions,
}

impl ChatRequest {
    /// Streamed chat request
    pub fn streaming(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            format: None,
            options,
        }
    }

    /// Buffered request constrained to JSON output with a token cap
    pub fn structured(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        mut options: GenerationOptions,
        max_tokens: u32,
    ) -> Self {
        options.insert("num_predict".to_string(), Value::from(max_tokens));
        Self {
            model: model.into(),
            messages,
            stream: false,
            format: Some("json".to_string()),
            options,
        }
    }

    /// Reject requests that must never reach the network
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "model name must not be empty".to_string(),
            ));
        }
        if self.messages.is_empty() {
            return Err(ClientError::InvalidInput(
                "at least one message is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("be terse");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "be terse"}));
    }

    #[test]
    fn test_streaming_request_omits_empty_fields() {
        let req = ChatRequest::streaming("llama3", vec![ChatMessage::user("hi")], Map::new());
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["stream"], json!(true));
        assert!(value.get("format").is_none());
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_structured_request_caps_output() {
        let mut options = Map::new();
        options.insert("temperature".to_string(), json!(0.2));

        let req = ChatRequest::structured("llama3", vec![ChatMessage::user("hi")], options, 200);
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["format"], json!("json"));
        assert_eq!(value["options"]["num_predict"], json!(200));
        assert_eq!(value["options"]["temperature"], json!(0.2));
    }

    #[test]
    fn test_message_order_preserved() {
        let history = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        let req = ChatRequest::streaming("m", history.clone(), Map::new());
        let value = serde_json::to_value(&req).unwrap();
        let contents: Vec<&str> = value["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["sys", "q1", "a1", "q2"]);
    }

    #[test]
    fn test_validate_rejects_empty_model_and_messages() {
        let req = ChatRequest::streaming(" ", vec![ChatMessage::user("hi")], Map::new());
        assert!(matches!(req.validate(), Err(ClientError::InvalidInput(_))));

        let req = ChatRequest::streaming("m", vec![], Map::new());
        assert!(matches!(req.validate(), Err(ClientError::InvalidInput(_))));
    }
}
