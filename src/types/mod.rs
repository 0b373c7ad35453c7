//! Type definitions module
//!
//! Chat messages, requests and per-call results.

pub mod messages;
pub mod results;

// Re-export commonly used types
pub use messages::{ChatMessage, ChatRequest, GenerationOptions, Role};
pub use results::{ChatResult, StreamDelta, NO_RESPONSE_SENTINEL};
