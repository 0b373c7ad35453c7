//! Per-call result types for streamed chat

use serde::{Deserialize, Serialize};

/// Text reported when a stream ended without delivering any content
pub const NO_RESPONSE_SENTINEL: &str = "Error: No response received.";

/// One decoded piece of a streamed answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDelta {
    pub content: String,
    pub is_final: bool,
}

impl StreamDelta {
    pub fn new(content: impl Into<String>, is_final: bool) -> Self {
        Self {
            content: content.into(),
            is_final,
        }
    }
}

/// Terminal value of one logical chat call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    pub full_text: String,
    pub succeeded: bool,
}

impl ChatResult {
    pub fn success(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            succeeded: true,
        }
    }

    /// The "model returned nothing" result
    pub fn empty() -> Self {
        Self {
            full_text: NO_RESPONSE_SENTINEL.to_string(),
            succeeded: false,
        }
    }

    pub fn is_empty_sentinel(&self) -> bool {
        !self.succeeded && self.full_text == NO_RESPONSE_SENTINEL
    }
}
